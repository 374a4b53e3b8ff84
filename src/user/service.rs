//! Profile management for authenticated users

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use super::repository::{RepositoryError, UserRepository};
use crate::models::{ProfileUpdate, User};

#[derive(Error, Debug)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Read and edit the profile attached to a wallet
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<User, UserError> {
        self.repository
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, UserError> {
        let user = self
            .repository
            .update_profile(user_id, update)
            .await?
            .ok_or(UserError::NotFound)?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    pub fn repository(&self) -> &Arc<dyn UserRepository> {
        &self.repository
    }
}
