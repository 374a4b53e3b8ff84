//! Authentication middleware
//!
//! Extractor for bearer-token verification and user extraction.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::TokenIssuer;
use crate::error::ApiError;

/// Authenticated user extracted from the session token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub wallet_address: String,
}

/// Extractor for authenticated users
///
/// This extractor verifies the JWT from the Authorization header. Tokens are
/// stateless, so no storage lookup happens here; handlers that need the
/// user record load it themselves.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, user {}", user.user_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<TokenIssuer>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized("Authentication required".to_string()))?;

        let tokens = Arc::<TokenIssuer>::from_ref(state);

        // Expired and forged tokens get the same answer
        let subject = tokens.validate(bearer.token()).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        Ok(AuthenticatedUser {
            user_id: subject.user_id,
            wallet_address: subject.wallet_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Request};

    const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    fn parts_with(authorization: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/api/user/profile");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_extracts_token_subject() {
        let tokens = Arc::new(TokenIssuer::new("test-secret", 900));
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id, WALLET).unwrap();

        let mut parts = parts_with(Some(format!("Bearer {}", token)));
        let user = AuthenticatedUser::from_request_parts(&mut parts, &tokens)
            .await
            .unwrap();

        assert_eq!(user.user_id, user_id);
        assert_eq!(user.wallet_address, WALLET);
    }

    #[tokio::test]
    async fn test_rejects_missing_and_foreign_tokens() {
        let tokens = Arc::new(TokenIssuer::new("test-secret", 900));

        let mut parts = parts_with(None);
        let err = AuthenticatedUser::from_request_parts(&mut parts, &tokens)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(m) if m == "Authentication required"));

        let foreign = TokenIssuer::new("other-secret", 900)
            .issue(Uuid::new_v4(), WALLET)
            .unwrap();
        let mut parts = parts_with(Some(format!("Bearer {}", foreign)));
        let err = AuthenticatedUser::from_request_parts(&mut parts, &tokens)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(m) if m == "Invalid or expired token"));
    }
}
