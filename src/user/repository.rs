//! User directory storage
//!
//! Users are looked up by id (from a session token) or by wallet address
//! (during login). Creation is lazy and idempotent per address.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ProfileUpdate, User};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, RepositoryError>;

    /// Return the user owning `wallet_address`, creating it on first sight
    async fn get_or_create(&self, wallet_address: &str) -> Result<User, RepositoryError>;

    /// Apply `update` to user `id`; `None` if no such user
    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError>;

    /// Cheap liveness probe for health checks
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Short backend name reported by the health endpoint
    fn backend(&self) -> &'static str;
}

/// Process-local directory used without a database and in tests
#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, User>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock().get(&id).cloned())
    }

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()
            .values()
            .find(|u| u.wallet_address == wallet_address)
            .cloned())
    }

    async fn get_or_create(&self, wallet_address: &str) -> Result<User, RepositoryError> {
        // Lookup and insert under one lock so concurrent logins agree on the id
        let mut users = self.lock();

        if let Some(user) = users.values().find(|u| u.wallet_address == wallet_address) {
            return Ok(user.clone());
        }

        let user = User::new(wallet_address, Utc::now());
        users.insert(user.id, user.clone());
        tracing::info!(user_id = %user.id, "Created user for new wallet");

        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let mut users = self.lock();

        Ok(users.get_mut(&id).map(|user| {
            user.apply(update, Utc::now());
            user.clone()
        }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// PostgreSQL-backed directory
#[derive(Clone)]
pub struct PgUserRepository {
    db_pool: PgPool,
}

impl PgUserRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

const USER_COLUMNS: &str =
    "id, wallet_address, name, gender, age, dob, bio, created_at, updated_at";

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(user)
    }

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE wallet_address = $1",
            USER_COLUMNS
        ))
        .bind(wallet_address)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn get_or_create(&self, wallet_address: &str) -> Result<User, RepositoryError> {
        let candidate = User::new(wallet_address, Utc::now());

        // A concurrent login for the same wallet may win the insert; fall back to its row
        let inserted: Option<User> = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (id, wallet_address, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (wallet_address) DO NOTHING
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(candidate.id)
        .bind(&candidate.wallet_address)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .fetch_optional(&self.db_pool)
        .await?;

        if let Some(user) = inserted {
            tracing::info!(user_id = %user.id, "Created user for new wallet");
            return Ok(user);
        }

        self.find_by_wallet(wallet_address)
            .await?
            .ok_or(RepositoryError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                gender = COALESCE($3, gender),
                age = COALESCE($4, age),
                dob = COALESCE($5, dob),
                bio = COALESCE($6, bio),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.gender)
        .bind(update.age)
        .bind(update.dob)
        .bind(update.bio)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.db_pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let repo = InMemoryUserRepository::new();
        let first = repo.get_or_create(WALLET).await.unwrap();
        let second = repo.get_or_create(WALLET).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.wallet_address, WALLET);
        assert_eq!(
            repo.find_by_wallet(WALLET).await.unwrap().map(|u| u.id),
            Some(first.id)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_login_creates_one_user() {
        let repo = InMemoryUserRepository::new();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.get_or_create(WALLET).await.unwrap().id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let repo = InMemoryUserRepository::new();
        let user = repo.get_or_create(WALLET).await.unwrap();

        let updated = repo
            .update_profile(
                user.id,
                ProfileUpdate {
                    name: Some("Satoshi".to_string()),
                    gender: Some(Gender::Other),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name.as_deref(), Some("Satoshi"));
        assert_eq!(updated.gender, Some(Gender::Other));
        assert_eq!(updated.wallet_address, WALLET);
        assert_eq!(repo.find_by_id(user.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = InMemoryUserRepository::new();
        let result = repo
            .update_profile(Uuid::new_v4(), ProfileUpdate::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
