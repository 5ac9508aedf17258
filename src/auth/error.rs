use thiserror::Error;

use crate::domain::ValidationError;

/// Failures reported by the stores behind the auth core and the book service.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(ref db_err)
                if db_err.code().is_some_and(|code| code == "23505") =>
            {
                Self::Conflict
            }
            other => Self::Backend(Box::new(other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("user with such credentials not found")]
    UserNotFound,
    #[error("user with this email already exists")]
    UserExists,
    #[error("refresh session not found")]
    SessionNotFound,
    #[error("refresh token expired")]
    RefreshTokenExpired,
    #[error("invalid token")]
    InvalidToken,
    #[error("credential hashing failed: {0}")]
    Hashing(#[source] anyhow::Error),
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("token lifetime overflows the clock")]
    LifetimeOverflow,
    #[error("random source failed: {0}")]
    Random(#[source] rand::Error),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl AuthError {
    /// Infrastructure failures that callers surface as internal errors.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Hashing(_)
                | Self::Signing(_)
                | Self::LifetimeOverflow
                | Self::Random(_)
                | Self::Store(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(matches!(StoreError::from(err), StoreError::Conflict));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(matches!(StoreError::from(err), StoreError::Backend(_)));
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::NotFound
        ));
    }

    #[test]
    fn internal_errors_are_classified() {
        assert!(AuthError::Store(StoreError::NotFound).is_internal());
        assert!(AuthError::Hashing(anyhow::anyhow!("boom")).is_internal());
        assert!(AuthError::LifetimeOverflow.is_internal());
        assert!(!AuthError::UserNotFound.is_internal());
        assert!(!AuthError::RefreshTokenExpired.is_internal());
        assert!(!AuthError::InvalidToken.is_internal());
    }
}
