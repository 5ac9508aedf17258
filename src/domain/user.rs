use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use super::validation::{self, MIN_NAME_LENGTH, MIN_PASSWORD_LENGTH, ValidationError};

/// Registered identity. `password` holds the credential digest, never plaintext.
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub registered_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"***")
            .field("registered_at", &self.registered_at)
            .finish()
    }
}

/// Row shape for `UserStore::create`; the store assigns the id.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub registered_at: DateTime<Utc>,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"***")
            .field("registered_at", &self.registered_at)
            .finish()
    }
}

/// One live refresh grant.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshSession {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshSession {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

impl fmt::Debug for RefreshSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshSession")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct NewRefreshSession {
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for NewRefreshSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewRefreshSession")
            .field("user_id", &self.user_id)
            .field("token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Clone)]
pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignUpInput {
    /// The name is checked in its trimmed, stored form.
    ///
    /// # Errors
    /// Returns the first failing field check.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::min_length("name", self.name.trim(), MIN_NAME_LENGTH)?;
        validation::email(&self.email)?;
        validation::min_length("password", &self.password, MIN_PASSWORD_LENGTH)
    }
}

impl fmt::Debug for SignUpInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpInput")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Clone)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

impl SignInInput {
    /// # Errors
    /// Returns the first failing field check.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::email(&self.email)?;
        validation::min_length("password", &self.password, MIN_PASSWORD_LENGTH)
    }
}

impl fmt::Debug for SignInInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInInput")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sign_up(name: &str, email: &str, password: &str) -> SignUpInput {
        SignUpInput {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn sign_up_input_accepts_valid_payload() {
        assert_eq!(
            sign_up("Alice", "alice@example.com", "secret1").validate(),
            Ok(())
        );
    }

    #[test]
    fn sign_up_input_rejects_short_name() {
        assert_eq!(
            sign_up("A", "alice@example.com", "secret1").validate(),
            Err(ValidationError::TooShort {
                field: "name",
                min: MIN_NAME_LENGTH
            })
        );
    }

    #[test]
    fn sign_up_input_counts_trimmed_name() {
        assert_eq!(
            sign_up(" A ", "alice@example.com", "secret1").validate(),
            Err(ValidationError::TooShort {
                field: "name",
                min: MIN_NAME_LENGTH
            })
        );
        assert_eq!(
            sign_up("  Al  ", "alice@example.com", "secret1").validate(),
            Ok(())
        );
    }

    #[test]
    fn sign_up_input_rejects_bad_email() {
        assert_eq!(
            sign_up("Alice", "alice.example.com", "secret1").validate(),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            sign_up("Alice", "", "secret1").validate(),
            Err(ValidationError::Required("email"))
        );
    }

    #[test]
    fn sign_in_input_rejects_short_password() {
        let input = SignInInput {
            email: "alice@example.com".to_string(),
            password: "12345".to_string(),
        };
        assert_eq!(
            input.validate(),
            Err(ValidationError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LENGTH
            })
        );
    }

    #[test]
    fn debug_output_masks_secrets() {
        let input = sign_up("Alice", "alice@example.com", "hunter22");
        let rendered = format!("{input:?}");
        assert!(!rendered.contains("hunter22"));

        let session = RefreshSession {
            id: 1,
            user_id: 7,
            token: "deadbeef".to_string(),
            expires_at: Utc::now(),
        };
        assert!(!format!("{session:?}").contains("deadbeef"));
    }

    #[test]
    fn user_json_omits_password_digest() -> anyhow::Result<()> {
        let user = User {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "digest".to_string(),
            registered_at: Utc::now(),
        };
        let value = serde_json::to_value(&user)?;
        assert!(value.get("password").is_none());
        assert_eq!(
            value.get("email").and_then(serde_json::Value::as_str),
            Some("alice@example.com")
        );
        Ok(())
    }

    #[test]
    fn session_expiry_is_strictly_before_now() {
        let now = Utc::now();
        let session = RefreshSession {
            id: 1,
            user_id: 1,
            token: String::new(),
            expires_at: now,
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::seconds(1)));
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }
}
