//! Wallet signature verification
//!
//! Verifies detached ed25519 signatures produced by Solana-style wallets.
//! Addresses are the base58 encoding of the 32-byte public key. Signatures
//! are 64 bytes, base58 by default or base64 when the client says so.

use base64::{engine::general_purpose, Engine as _};
use ed25519_dalek::{Signature, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during signature verification
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid wallet address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Signature verification failed")]
    VerificationFailed,
}

/// Text encoding of the signature submitted by the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureEncoding {
    #[default]
    Base58,
    Base64,
}

impl SignatureEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureEncoding::Base58 => "base58",
            SignatureEncoding::Base64 => "base64",
        }
    }

    fn decode(&self, encoded: &str) -> Result<Vec<u8>, CryptoError> {
        match self {
            SignatureEncoding::Base58 => bs58::decode(encoded)
                .into_vec()
                .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string())),
            SignatureEncoding::Base64 => general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string())),
        }
    }
}

/// Check that `message` was signed by the key behind `wallet_address`.
///
/// Total over its inputs: malformed addresses or signatures yield `false`.
/// The message bytes are used exactly as given.
pub fn verify_signature(
    message: &[u8],
    signature: &str,
    wallet_address: &str,
    encoding: SignatureEncoding,
) -> bool {
    match check_signature(message, signature, wallet_address, encoding) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(
                error = %e,
                encoding = encoding.as_str(),
                signature_len = signature.len(),
                "Signature rejected"
            );
            false
        }
    }
}

/// Verification with the failure reason kept for diagnostics
pub fn check_signature(
    message: &[u8],
    signature: &str,
    wallet_address: &str,
    encoding: SignatureEncoding,
) -> Result<(), CryptoError> {
    let public_key_bytes = decode_wallet_address(wallet_address)?;

    let signature_bytes = encoding.decode(signature)?;
    if signature_bytes.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::InvalidSignatureFormat(format!(
            "Expected {} bytes, got {}",
            SIGNATURE_LENGTH,
            signature_bytes.len()
        )));
    }
    let signature = Signature::from_slice(&signature_bytes)
        .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;

    let verifying_key = VerifyingKey::from_bytes(&public_key_bytes)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;

    verifying_key
        .verify_strict(message, &signature)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// Decode a base58 wallet address into its 32-byte public key
pub fn decode_wallet_address(address: &str) -> Result<[u8; PUBLIC_KEY_LENGTH], CryptoError> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| CryptoError::InvalidAddressFormat(e.to_string()))?;

    decoded.as_slice().try_into().map_err(|_| {
        CryptoError::InvalidAddressFormat(format!(
            "Expected {} bytes, got {}",
            PUBLIC_KEY_LENGTH,
            decoded.len()
        ))
    })
}
