//! Middleware and extractors
//!
//! Request tracing, security headers, bearer authentication and validated
//! JSON bodies.

pub mod auth;
mod security;
mod tracing;
mod validation;

pub use auth::AuthenticatedUser;
pub use security::security_headers;
pub use self::tracing::request_tracing;
pub use validation::ValidatedJson;
