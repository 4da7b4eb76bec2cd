use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::{ApiRequest, ApiResponse, Method, RequestBody};
use crate::config::AppConfig;
use crate::error::ConsoleError;

/// Sends one request and returns whatever the backend answered.
///
/// Implementations never interpret status codes; auth retry and error
/// mapping live in [`super::HttpClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ConsoleError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    config: AppConfig,
}

impl ReqwestTransport {
    pub fn new(config: &AppConfig) -> Result<Self, ConsoleError> {
        config.base_url()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ConsoleError> {
        let url = self.config.endpoint_url(&request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let request_id = Uuid::new_v4();
        let mut builder = self
            .client
            .request(method, &url)
            .header("X-Request-ID", request_id.to_string());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!("[{}] {} {} -> {}", request_id, request.method, url, status.as_u16());

        let body = if bytes.is_empty() || status == reqwest::StatusCode::NO_CONTENT {
            None
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => Some(value),
                Err(e) if status.is_success() => return Err(e.into()),
                // Non-JSON error pages fall back to the generic message
                Err(_) => None,
            }
        };

        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}
