pub mod auth;
pub mod me;
pub mod nav;
pub mod resource;
