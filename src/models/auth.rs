//! Authentication request/response DTOs

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use validator::Validate;

use super::User;
use crate::auth::SignatureEncoding;

/// Query for `GET /auth/nonce`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonceQuery {
    pub wallet_address: Option<String>,
}

/// Challenge handed to the wallet for signing
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub nonce: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// Request to verify a signed challenge
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[validate(length(min = 32, max = 44))]
    pub wallet_address: String,
    #[validate(length(min = 1))]
    pub message: String,
    #[validate(length(min = 1))]
    pub signature: String,
    #[serde(default)]
    pub signature_encoding: SignatureEncoding,
}

/// Successful login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: String,
    pub user: User,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}
