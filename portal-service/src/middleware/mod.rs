pub mod admin;
pub mod auth;

pub use admin::{admin_auth_middleware, ADMIN_API_KEY_HEADER};
pub use auth::{auth_middleware, AuthActor, AuthUser};
