//! User profile handlers

use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::middleware::{AuthenticatedUser, ValidatedJson};
use crate::models::{ProfileResponse, UpdateProfileRequest, UpdateProfileResponse};
use crate::state::AppState;

/// GET /user/profile - Profile of the authenticated wallet
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    tracing::debug!(user_id = %user.user_id, wallet = %user.wallet_address, "Fetching profile");

    let user = state.user_service.get_profile(user.user_id).await?;

    Ok(Json(ProfileResponse { user }))
}

/// PUT /user/profile - Update profile fields of the authenticated wallet
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>, ApiError> {
    let update = req.into_update().map_err(|e| ApiError::ValidationError {
        message: "Validation failed".to_string(),
        details: serde_json::to_value(&e).ok(),
    })?;

    tracing::debug!(user_id = %user.user_id, wallet = %user.wallet_address, "Updating profile");

    let user = state.user_service.update_profile(user.user_id, update).await?;

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully".to_string(),
        user,
    }))
}
