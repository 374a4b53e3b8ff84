//! Service banner and health check

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

pub async fn root() -> &'static str {
    "Wallet Auth API Server"
}

/// Health check response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub user_store: String,
    pub version: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let repository = state.user_service.repository();

    let (status, user_store) = match repository.ping().await {
        Ok(()) => ("healthy", format!("{}: connected", repository.backend())),
        Err(e) => {
            tracing::warn!(error = %e, "User store health check failed");
            ("unhealthy", format!("{}: unavailable", repository.backend()))
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        user_store,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
