use serde_json::{json, Value};

use crate::error::ConsoleError;
use crate::http::{ApiRequest, HttpClient};
use crate::menu::MenuNode;
use crate::session::UserProfile;

/// Self-service `/users/me*` endpoints.
#[derive(Clone)]
pub struct UsersApi {
    http: HttpClient,
}

impl UsersApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// `GET /users/me`
    pub async fn me(&self) -> Result<UserProfile, ConsoleError> {
        self.http.get("/users/me").await
    }

    /// `GET /users/me/menu` - the current user's navigation tree, in order.
    pub async fn menu(&self) -> Result<Vec<MenuNode>, ConsoleError> {
        self.http.get("/users/me/menu").await
    }

    /// `PATCH /users/me`
    pub async fn update_me(&self, changes: Value) -> Result<UserProfile, ConsoleError> {
        self.http.execute_json(ApiRequest::patch("/users/me").json(changes)).await
    }

    /// `PATCH /users/me/password`
    pub async fn update_password(&self, current_password: &str, new_password: &str) -> Result<Value, ConsoleError> {
        let request = ApiRequest::patch("/users/me/password").json(json!({
            "current_password": current_password,
            "new_password": new_password,
        }));
        self.http.execute_json(request).await
    }
}
