//! Authentication service
//!
//! Core business logic for wallet-based authentication. A login is a
//! challenge/response exchange:
//!
//! 1. `request_nonce` issues a challenge for the wallet (replacing any
//!    previous one).
//! 2. The wallet signs the challenge message off-device.
//! 3. `verify` consumes the challenge, checks the signature, resolves or
//!    creates the user and mints a session token.
//!
//! A challenge is consumed by the first verification attempt whatever its
//! outcome, so a signed challenge can never be replayed.

use std::sync::Arc;

use thiserror::Error;

use crate::models::{ChallengeResponse, User};
use crate::user::{RepositoryError, UserRepository};

use super::clock::Clock;
use super::crypto::{verify_signature, SignatureEncoding};
use super::jwt::{JwtError, TokenIssuer};
use super::nonce_store::NonceStore;

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// No challenge, an expired one, or one for a different message
    #[error("Nonce expired or invalid")]
    InvalidNonce,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("User store error: {0}")]
    UserStore(#[from] RepositoryError),

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user: User,
    pub token: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    nonces: Arc<dyn NonceStore>,
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        nonces: Arc<dyn NonceStore>,
        users: Arc<dyn UserRepository>,
        tokens: Arc<TokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            nonces,
            users,
            tokens,
            clock,
        }
    }

    /// Issue a challenge for `wallet_address`. Always succeeds.
    pub async fn request_nonce(&self, wallet_address: &str) -> ChallengeResponse {
        let wallet_address = wallet_address.trim();
        let challenge = self.nonces.issue(wallet_address).await;

        tracing::debug!(
            wallet = %wallet_address,
            expires_at = %challenge.expires_at,
            "Issued login challenge"
        );

        ChallengeResponse {
            nonce: challenge.nonce,
            message: challenge.message,
            expires_at: challenge.expires_at,
        }
    }

    /// Verify a signed challenge and log the wallet in
    pub async fn verify(
        &self,
        wallet_address: &str,
        message: &str,
        signature: &str,
        encoding: SignatureEncoding,
    ) -> Result<AuthOutcome, AuthError> {
        // Same key as request_nonce
        let wallet_address = wallet_address.trim();

        // Removed before anything else so a second attempt always fails
        let challenge = self
            .nonces
            .consume(wallet_address)
            .await
            .ok_or(AuthError::InvalidNonce)?;

        if challenge.is_expired(self.clock.now()) {
            tracing::debug!(wallet = %wallet_address, "Login challenge expired");
            return Err(AuthError::InvalidNonce);
        }

        // The signature must cover the outstanding challenge, not an older one
        if challenge.message.as_bytes() != message.as_bytes() {
            tracing::debug!(wallet = %wallet_address, "Signed message does not match challenge");
            return Err(AuthError::InvalidNonce);
        }

        if !verify_signature(message.as_bytes(), signature, wallet_address, encoding) {
            tracing::warn!(wallet = %wallet_address, "Rejected login with invalid signature");
            return Err(AuthError::InvalidSignature);
        }

        let user = self.users.get_or_create(wallet_address).await?;
        let token = self.tokens.issue(user.id, &user.wallet_address)?;

        tracing::info!(user_id = %user.id, wallet = %wallet_address, "Wallet authenticated");

        Ok(AuthOutcome { user, token })
    }

    /// Token issuer shared with the request extractor
    pub fn tokens(&self) -> &Arc<TokenIssuer> {
        &self.tokens
    }
}
