pub mod transport;

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{error_detail, ConsoleError};
use crate::session::{SessionHandle, TokenPair};
pub use transport::{ReqwestTransport, Transport};

/// Token refresh endpoint. A 401 from this endpoint is terminal.
pub const REFRESH_ENDPOINT: &str = "/login/refresh-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Endpoint path below the API prefix, e.g. `/items/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Filled in by [`HttpClient`] right before sending.
    pub bearer: Option<String>,
    /// Set once the request has been replayed after a refresh.
    pub retried: bool,
    /// Credential exchanges opt out of the refresh-and-retry path.
    pub allow_refresh: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
            retried: false,
            allow_refresh: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn without_refresh(mut self) -> Self {
        self.allow_refresh = false;
        self
    }

    fn is_refresh(&self) -> bool {
        self.path.trim_end_matches('/') == REFRESH_ENDPOINT
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn into_result(self) -> Result<Option<Value>, ConsoleError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(ConsoleError::Api {
                status: self.status,
                detail: error_detail(self.body.as_ref()),
            })
        }
    }
}

/// Authenticated API client.
///
/// Attaches the session's bearer token to every request. A 401 on a request
/// that hasn't been replayed yet triggers one refresh-token exchange and one
/// replay; if the refresh fails the session is cleared and the caller gets
/// [`ConsoleError::SessionExpired`].
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    session: SessionHandle,
    login_path: String,
    refresh_lock: Arc<Mutex<()>>,
}

impl HttpClient {
    pub fn new(transport: Arc<dyn Transport>, session: SessionHandle, login_path: impl Into<String>) -> Self {
        Self {
            transport,
            session,
            login_path: login_path.into(),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Send a request through the auth pipeline. `Ok(None)` means the
    /// backend answered 2xx without a body.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<Option<Value>, ConsoleError> {
        request.bearer = self.session.access_token();
        let response = self.transport.send(&request).await?;

        if response.status != 401 || request.retried || !request.allow_refresh || request.is_refresh() {
            return response.into_result();
        }

        debug!("{} {} returned 401, attempting token refresh", request.method, request.path);
        if let Err(e) = self.refresh_after(request.bearer.as_deref()).await {
            warn!("Token refresh failed, ending session: {}", e);
            self.session.clear();
            return Err(ConsoleError::SessionExpired {
                redirect: self.login_path.clone(),
            });
        }

        request.retried = true;
        request.bearer = self.session.access_token();
        self.transport.send(&request).await?.into_result()
    }

    /// Execute and decode the body. An empty body decodes from JSON `null`.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ConsoleError> {
        let body = self.execute(request).await?;
        Ok(serde_json::from_value(body.unwrap_or(Value::Null))?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConsoleError> {
        self.execute_json(ApiRequest::get(path)).await
    }

    /// Exchange the refresh token for a new pair unconditionally.
    pub async fn refresh(&self) -> Result<(), ConsoleError> {
        let _guard = self.refresh_lock.lock().await;
        self.exchange_refresh_token().await
    }

    /// Refresh unless another request already replaced the token that was
    /// rejected while we waited for the lock.
    async fn refresh_after(&self, rejected: Option<&str>) -> Result<(), ConsoleError> {
        let _guard = self.refresh_lock.lock().await;
        let current = self.session.access_token();
        if current.is_some() && current.as_deref() != rejected {
            debug!("Access token already refreshed by a concurrent request");
            return Ok(());
        }
        self.exchange_refresh_token().await
    }

    async fn exchange_refresh_token(&self) -> Result<(), ConsoleError> {
        let refresh_token = self.session.refresh_token().ok_or(ConsoleError::NotAuthenticated)?;
        let request = ApiRequest::post(REFRESH_ENDPOINT)
            .query("refresh_token", refresh_token)
            .without_refresh();

        let body = self.transport.send(&request).await?.into_result()?;
        let tokens: TokenPair = serde_json::from_value(body.unwrap_or(Value::Null))?;
        self.session.set_tokens(&tokens)?;
        info!("Access token refreshed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryTokenStorage, PersistedTokens, TokenStorage};
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    fn client_with(transport: Arc<ScriptedTransport>) -> (HttpClient, Arc<MemoryTokenStorage>) {
        let storage = Arc::new(MemoryTokenStorage::with_tokens(PersistedTokens::new("old-access", "old-refresh")));
        let session = SessionHandle::new(storage.clone());
        (HttpClient::new(transport, session, "/auth/login"), storage)
    }

    #[tokio::test]
    async fn attaches_bearer_token() {
        let transport = Arc::new(ScriptedTransport::new(vec![ApiResponse { status: 200, body: Some(json!([])) }]));
        let (client, _) = client_with(transport.clone());

        let items: Vec<Value> = client.get("/items/").await.unwrap();
        assert!(items.is_empty());
        let sent = transport.requests();
        assert_eq!(sent[0].bearer.as_deref(), Some("old-access"));
    }

    #[tokio::test]
    async fn refreshes_once_and_replays() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ApiResponse { status: 401, body: Some(json!({ "detail": "expired" })) },
            ApiResponse { status: 200, body: Some(json!({ "access_token": "new-access", "refresh_token": "new-refresh" })) },
            ApiResponse { status: 200, body: Some(json!({ "id": 1 })) },
        ]));
        let (client, storage) = client_with(transport.clone());

        let body = client.execute(ApiRequest::get("/items/1")).await.unwrap();
        assert_eq!(body, Some(json!({ "id": 1 })));

        let sent = transport.requests();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].path, REFRESH_ENDPOINT);
        assert_eq!(sent[1].query, vec![("refresh_token".to_string(), "old-refresh".to_string())]);
        assert_eq!(sent[2].bearer.as_deref(), Some("new-access"));
        assert!(sent[2].retried);
        assert_eq!(storage.load().unwrap().refresh_token, "new-refresh");
    }

    #[tokio::test]
    async fn second_401_is_not_refreshed_again() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ApiResponse { status: 401, body: None },
            ApiResponse { status: 200, body: Some(json!({ "access_token": "new-access", "refresh_token": "new-refresh" })) },
            ApiResponse { status: 401, body: Some(json!({ "detail": "still no" })) },
        ]));
        let (client, _) = client_with(transport.clone());

        let err = client.execute(ApiRequest::get("/items/")).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Api { status: 401, .. }));
        assert_eq!(transport.requests().len(), 3);
        assert_eq!(transport.count_path(REFRESH_ENDPOINT), 1);
    }

    #[tokio::test]
    async fn refresh_failure_clears_session() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ApiResponse { status: 401, body: None },
            ApiResponse { status: 401, body: Some(json!({ "detail": "refresh expired" })) },
        ]));
        let (client, storage) = client_with(transport.clone());

        let err = client.execute(ApiRequest::get("/users/me")).await.unwrap_err();
        match err {
            ConsoleError::SessionExpired { redirect } => assert_eq!(redirect, "/auth/login"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!client.session().is_authenticated());
        assert!(storage.is_empty());
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn opted_out_requests_surface_401() {
        let transport = Arc::new(ScriptedTransport::new(vec![ApiResponse {
            status: 401,
            body: Some(json!({ "detail": "nope" })),
        }]));
        let (client, _) = client_with(transport.clone());

        let err = client
            .execute(ApiRequest::post("/login/access-token").without_refresh())
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Api { status: 401, .. }));
        assert!(client.session().is_authenticated());
    }

    #[tokio::test]
    async fn no_content_is_none() {
        let transport = Arc::new(ScriptedTransport::new(vec![ApiResponse { status: 204, body: None }]));
        let (client, _) = client_with(transport);
        assert_eq!(client.execute(ApiRequest::delete("/items/1")).await.unwrap(), None);
    }
}
