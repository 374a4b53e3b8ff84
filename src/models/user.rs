//! Profile request/response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{Gender, ProfileUpdate, User};

/// Body of `PUT /user/profile`
#[derive(Debug, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    pub gender: Option<Gender>,
    #[validate(range(min = 13, max = 120))]
    pub age: Option<i32>,
    /// RFC 3339 date-time
    #[validate(custom = "validate_dob")]
    pub dob: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
}

impl UpdateProfileRequest {
    /// Convert a validated request into a domain update
    pub fn into_update(self) -> Result<ProfileUpdate, ValidationError> {
        let dob = self.dob.as_deref().map(parse_dob).transpose()?;

        Ok(ProfileUpdate {
            name: self.name,
            gender: self.gender,
            age: self.age,
            dob,
            bio: self.bio,
        })
    }
}

fn parse_dob(dob: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(dob)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| {
            let mut err = ValidationError::new("datetime");
            err.message = Some("dob must be an RFC 3339 date-time".into());
            err
        })
}

fn validate_dob(dob: &str) -> Result<(), ValidationError> {
    parse_dob(dob).map(|_| ())
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub message: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_update() {
        let req: UpdateProfileRequest = serde_json::from_str(
            r#"{"name":"Alice","age":30,"dob":"1994-05-01T00:00:00Z","bio":"gm","gender":"female"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());

        let update = req.into_update().unwrap();
        assert_eq!(update.name.as_deref(), Some("Alice"));
        assert_eq!(update.gender, Some(Gender::Female));
        assert_eq!(update.dob.unwrap().to_rfc3339(), "1994-05-01T00:00:00+00:00");
    }

    #[test]
    fn test_empty_update_is_valid() {
        let req = UpdateProfileRequest::default();
        assert!(req.validate().is_ok());
        assert_eq!(req.into_update().unwrap(), ProfileUpdate::default());
    }

    #[test]
    fn test_field_rules() {
        let cases = [
            (r#"{"name":"A"}"#, "name"),
            (r#"{"age":12}"#, "age"),
            (r#"{"age":121}"#, "age"),
            (r#"{"dob":"1994-05-01"}"#, "dob"),
        ];

        for (body, field) in cases {
            let req: UpdateProfileRequest = serde_json::from_str(body).unwrap();
            let errors = req.validate().unwrap_err();
            assert!(
                errors.field_errors().contains_key(field),
                "expected error on {} for {}",
                field,
                body
            );
        }

        let long_bio = UpdateProfileRequest {
            bio: Some("x".repeat(501)),
            ..Default::default()
        };
        assert!(long_bio.validate().is_err());
    }

    #[test]
    fn test_unknown_gender_fails_to_parse() {
        let result = serde_json::from_str::<UpdateProfileRequest>(r#"{"gender":"robot"}"#);
        assert!(result.is_err());
    }
}
