//! Data models for the wallet auth server

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod auth;
pub mod user;
pub use auth::*;
pub use user::*;

/// User model
///
/// Keyed by the wallet address that first proved ownership; the address
/// never changes after creation.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub wallet_address: String,
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i32>,
    pub dob: Option<DateTime<Utc>>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Fresh record with no profile fields set
    pub fn new(wallet_address: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_address: wallet_address.to_string(),
            name: None,
            gender: None,
            age: None,
            dob: None,
            bio: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the fields present in `update`
    pub fn apply(&mut self, update: ProfileUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(gender) = update.gender {
            self.gender = Some(gender);
        }
        if let Some(age) = update.age {
            self.age = Some(age);
        }
        if let Some(dob) = update.dob {
            self.dob = Some(dob);
        }
        if let Some(bio) = update.bio {
            self.bio = Some(bio);
        }
        self.updated_at = now;
    }
}

/// Self-declared gender
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Partial profile change; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i32>,
    pub dob: Option<DateTime<Utc>>,
    pub bio: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_touches_given_fields() {
        let now = Utc::now();
        let mut user = User::new("wallet", now);
        user.bio = Some("old bio".to_string());

        let later = now + chrono::Duration::seconds(10);
        user.apply(
            ProfileUpdate {
                name: Some("Alice".to_string()),
                ..Default::default()
            },
            later,
        );

        assert_eq!(user.name.as_deref(), Some("Alice"));
        assert_eq!(user.bio.as_deref(), Some("old bio"));
        assert_eq!(user.wallet_address, "wallet");
        assert_eq!(user.updated_at, later);
        assert_eq!(user.created_at, now);
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let user = User::new("wallet", Utc::now());
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["walletAddress"], "wallet");
        assert!(json.get("createdAt").is_some());
    }
}
