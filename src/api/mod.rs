//! Thin wrappers over the backend REST surface, one method per endpoint.

pub mod auth;
pub mod resource;
pub mod users;

pub use auth::AuthApi;
pub use resource::{Resource, ResourceKind};
pub use users::UsersApi;
