use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ConsoleError;
use crate::http::{ApiRequest, HttpClient};

/// Business and administration entities exposed as plain CRUD endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Items,
    Groups,
    Applications,
    Tasks,
    TaskExecutions,
    Users,
    Roles,
    Permissions,
    Menus,
    Apis,
    Policies,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 11] = [
        ResourceKind::Items,
        ResourceKind::Groups,
        ResourceKind::Applications,
        ResourceKind::Tasks,
        ResourceKind::TaskExecutions,
        ResourceKind::Users,
        ResourceKind::Roles,
        ResourceKind::Permissions,
        ResourceKind::Menus,
        ResourceKind::Apis,
        ResourceKind::Policies,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Items => "items",
            ResourceKind::Groups => "groups",
            ResourceKind::Applications => "applications",
            ResourceKind::Tasks => "tasks",
            ResourceKind::TaskExecutions => "task-executions",
            ResourceKind::Users => "users",
            ResourceKind::Roles => "roles",
            ResourceKind::Permissions => "permissions",
            ResourceKind::Menus => "menus",
            ResourceKind::Apis => "apis",
            ResourceKind::Policies => "policies",
        }
    }

    /// Collection path, with the trailing slash the backend expects.
    pub fn collection_path(&self) -> String {
        format!("/{}/", self.name())
    }

    pub fn record_path(&self, id: &str) -> String {
        format!("/{}/{}", self.name(), id)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceKind {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_matches('/').to_ascii_lowercase().replace('_', "-");
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| ConsoleError::UnknownResource(s.to_string()))
    }
}

/// CRUD client for one resource kind. Each call maps to exactly one request.
#[derive(Clone)]
pub struct Resource {
    http: HttpClient,
    kind: ResourceKind,
}

impl Resource {
    pub fn new(http: HttpClient, kind: ResourceKind) -> Self {
        Self { http, kind }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// `GET /{kind}/`
    pub async fn list(&self) -> Result<Value, ConsoleError> {
        self.body(ApiRequest::get(self.kind.collection_path())).await
    }

    /// `GET /{kind}/{id}`
    pub async fn get(&self, id: &str) -> Result<Value, ConsoleError> {
        self.body(ApiRequest::get(self.kind.record_path(id))).await
    }

    /// `POST /{kind}/`
    pub async fn create(&self, record: Value) -> Result<Value, ConsoleError> {
        self.body(ApiRequest::post(self.kind.collection_path()).json(record)).await
    }

    /// `PUT /{kind}/{id}`
    pub async fn update(&self, id: &str, record: Value) -> Result<Value, ConsoleError> {
        self.body(ApiRequest::put(self.kind.record_path(id)).json(record)).await
    }

    /// `PATCH /{kind}/{id}`
    pub async fn patch(&self, id: &str, changes: Value) -> Result<Value, ConsoleError> {
        self.body(ApiRequest::patch(self.kind.record_path(id)).json(changes)).await
    }

    /// `DELETE /{kind}/{id}`
    pub async fn delete(&self, id: &str) -> Result<Value, ConsoleError> {
        self.body(ApiRequest::delete(self.kind.record_path(id))).await
    }

    async fn body(&self, request: ApiRequest) -> Result<Value, ConsoleError> {
        Ok(self.http.execute(request).await?.unwrap_or(Value::Null))
    }
}
