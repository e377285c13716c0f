pub mod auth;

pub use auth::{AuthClient, AuthUser};
