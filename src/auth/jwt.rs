//! JWT token generation and validation
//!
//! Session tokens are stateless: nothing is stored server side, a token is
//! good until its `exp` passes.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::clock::{Clock, SystemClock};

/// Clock skew tolerated on `exp`
const EXP_LEEWAY_SECONDS: i64 = 60;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Wallet address the session was proven for
    pub wallet_address: String,
    /// JWT ID
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Identity carried by a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub wallet_address: String,
}

/// Signs and checks session tokens with a shared HMAC secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self::with_clock(secret, ttl_seconds, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: &str, ttl_seconds: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_seconds),
            clock,
        }
    }

    /// Token lifetime in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Mint a token for `user_id` bound to `wallet_address`
    pub fn issue(&self, user_id: Uuid, wallet_address: &str) -> Result<String, JwtError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: user_id.to_string(),
            wallet_address: wallet_address.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and check a token's signature and expiry
    pub fn decode_claims(&self, token: &str) -> Result<Claims, JwtError> {
        // Expiry is checked against our clock below, not the system time
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                    _ => JwtError::DecodingFailed(e.to_string()),
                }
            })?;

        if token_data.claims.exp < self.clock.now().timestamp() - EXP_LEEWAY_SECONDS {
            return Err(JwtError::TokenExpired);
        }

        Ok(token_data.claims)
    }

    /// Validate a token and return who it was issued to
    pub fn validate(&self, token: &str) -> Result<TokenSubject, JwtError> {
        let claims = self.decode_claims(token)?;
        let user_id = get_user_id_from_claims(&claims)?;

        Ok(TokenSubject {
            user_id,
            wallet_address: claims.wallet_address,
        })
    }
}

/// Extract user ID from claims
pub fn get_user_id_from_claims(claims: &Claims) -> Result<Uuid, JwtError> {
    Uuid::parse_str(&claims.sub).map_err(|e| JwtError::InvalidToken(e.to_string()))
}
