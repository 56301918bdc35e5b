//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use voltio_core::validation::{self, FieldErrors};
use voltio_core::{Email, UserId, UserRole};

/// A customer or admin account. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub role: UserRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile form as submitted by the user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// Profile fields after validation and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProfile {
    pub name: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

impl ProfileUpdate {
    /// Validate the form. Address fields are optional, but a present phone or
    /// postal code must be well-formed.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<ValidProfile, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = errors.check("name", validation::required(&self.name, 100));
        let phone = errors
            .check("phone", validation::optional(self.phone.as_deref(), 30))
            .flatten()
            .and_then(|p| errors.check("phone", validation::phone(&p)));
        let street = errors
            .check("street", validation::optional(self.street.as_deref(), 200))
            .flatten();
        let city = errors
            .check("city", validation::optional(self.city.as_deref(), 100))
            .flatten();
        let postal_code = errors
            .check(
                "postal_code",
                validation::optional(self.postal_code.as_deref(), 10),
            )
            .flatten()
            .and_then(|p| errors.check("postal_code", validation::postal_code(&p)));

        errors.into_result()?;
        Ok(ValidProfile {
            name: name.unwrap_or_default(),
            phone,
            street,
            city,
            postal_code,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_profile_is_valid() {
        let profile = ProfileUpdate {
            name: " Ana Torres ".to_owned(),
            ..ProfileUpdate::default()
        }
        .validate()
        .unwrap();
        assert_eq!(profile.name, "Ana Torres");
        assert_eq!(profile.phone, None);
    }

    #[test]
    fn test_blank_optional_fields_become_none() {
        let profile = ProfileUpdate {
            name: "Ana".to_owned(),
            phone: Some("  ".to_owned()),
            postal_code: Some(String::new()),
            ..ProfileUpdate::default()
        }
        .validate()
        .unwrap();
        assert_eq!(profile.phone, None);
        assert_eq!(profile.postal_code, None);
    }

    #[test]
    fn test_invalid_fields_reported_together() {
        let errors = ProfileUpdate {
            name: String::new(),
            phone: Some("123".to_owned()),
            postal_code: Some("ABCDE".to_owned()),
            ..ProfileUpdate::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_phone_is_normalized() {
        let profile = ProfileUpdate {
            name: "Ana".to_owned(),
            phone: Some("55 1234 5678".to_owned()),
            ..ProfileUpdate::default()
        }
        .validate()
        .unwrap();
        assert_eq!(profile.phone.as_deref(), Some("5512345678"));
    }
}
