//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::auth;
use crate::state::AppState;

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/nonce", get(auth::get_nonce))
        .route("/auth/verify", post(auth::verify))
        .route("/auth/verify-nonce", post(auth::verify))
        .route("/auth/wallet-login", post(auth::verify))
}
