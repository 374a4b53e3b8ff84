//! Authentication HTTP handlers
//!
//! Endpoints for wallet-based authentication.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use crate::error::ApiError;
use crate::middleware::ValidatedJson;
use crate::models::{AuthResponse, ChallengeResponse, NonceQuery, VerifyRequest};
use crate::state::AppState;

/// GET /auth/nonce - Request a challenge for wallet authentication
pub async fn get_nonce(
    State(state): State<AppState>,
    query: Result<Query<NonceQuery>, QueryRejection>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let Query(query) = query?;

    let wallet_address = query
        .wallet_address
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Wallet address is required"))?;

    let challenge = state.auth_service.request_nonce(wallet_address).await;

    Ok(Json(challenge))
}

/// POST /auth/verify - Verify a signed challenge and issue a session token
pub async fn verify(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let outcome = state
        .auth_service
        .verify(
            &req.wallet_address,
            &req.message,
            &req.signature,
            req.signature_encoding,
        )
        .await?;

    Ok(Json(AuthResponse {
        message: "Wallet verified successfully".to_string(),
        user: outcome.user,
        token: outcome.token,
        token_type: "Bearer".to_string(),
        expires_in: state.token_issuer.ttl_seconds(),
    }))
}
