//! Authentication module
//!
//! Provides wallet-based authentication using ed25519 wallet addresses.
//! - Challenge-response authentication with single-use nonces
//! - Detached signature verification
//! - Stateless JWT session tokens

pub mod clock;
mod crypto;
mod jwt;
pub mod nonce_store;
mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use crypto::{
    check_signature, decode_wallet_address, verify_signature, CryptoError, SignatureEncoding,
};
pub use jwt::{Claims, JwtError, TokenIssuer, TokenSubject};
pub use nonce_store::{
    challenge_message, spawn_nonce_sweeper, Challenge, InMemoryNonceStore, NonceStore,
};
pub use service::{AuthError, AuthOutcome, AuthService};
