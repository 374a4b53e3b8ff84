//! Route definitions for the wallet auth API

mod auth;
mod user;

use axum::{routing::get, Router};

use crate::handlers::health::{health_check, root};
use crate::middleware;
use crate::state::AppState;

pub use auth::auth_routes;
pub use user::user_routes;

/// Full application router with the shared middleware stack.
///
/// API routes live under `/api`; `/` and `/health` stay at the top level.
pub fn app_router(state: AppState) -> Router {
    let api = Router::new().merge(auth_routes()).merge(user_routes());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
}
