use serde_json::{json, Value};

use crate::error::ConsoleError;
use crate::http::{ApiRequest, HttpClient};
use crate::session::{TokenPair, UserProfile};

/// `/login/*` endpoints.
#[derive(Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// `POST /login/access-token` with a form-encoded body.
    ///
    /// Rejected credentials come back as [`ConsoleError::Authentication`];
    /// other failures propagate unchanged.
    pub async fn access_token(&self, username: &str, password: &str) -> Result<TokenPair, ConsoleError> {
        let request = ApiRequest::post("/login/access-token")
            .form([("username", username), ("password", password)])
            .without_refresh();

        match self.http.execute_json(request).await {
            Err(ConsoleError::Api {
                status: status @ (400 | 401),
                detail,
            }) => Err(ConsoleError::Authentication { status, detail }),
            other => other,
        }
    }

    /// `POST /login/refresh-token`
    pub async fn refresh_token(&self) -> Result<(), ConsoleError> {
        self.http.refresh().await
    }

    /// `POST /login/test-token`
    pub async fn test_token(&self) -> Result<UserProfile, ConsoleError> {
        self.http.execute_json(ApiRequest::post("/login/test-token")).await
    }

    /// `POST /login/register`
    pub async fn register(&self, email: &str, password: &str, full_name: Option<&str>) -> Result<Value, ConsoleError> {
        let request = ApiRequest::post("/login/register")
            .json(json!({
                "email": email,
                "password": password,
                "full_name": full_name,
            }))
            .without_refresh();
        self.http.execute_json(request).await
    }

    /// `POST /login/password-recovery/{email}`
    pub async fn password_recovery(&self, email: &str) -> Result<Value, ConsoleError> {
        let request = ApiRequest::post(format!("/login/password-recovery/{}", email)).without_refresh();
        self.http.execute_json(request).await
    }

    /// `POST /login/reset-password/`
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<Value, ConsoleError> {
        let request = ApiRequest::post("/login/reset-password/")
            .json(json!({ "token": token, "new_password": new_password }))
            .without_refresh();
        self.http.execute_json(request).await
    }
}
