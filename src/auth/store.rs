//! Storage capabilities the auth core depends on.
use async_trait::async_trait;

use super::error::StoreError;
use super::hasher::constant_time_eq;
use crate::domain::{NewRefreshSession, NewUser, RefreshSession, User};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a user. Returns `StoreError::Conflict` when the email is taken.
    async fn create(&self, user: NewUser) -> Result<(), StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Resolve a user by email and credential digest.
    ///
    /// The row is fetched by email alone; the digest is compared in constant
    /// time so lookup timing does not depend on how much of it matches.
    async fn find_by_credential(
        &self,
        email: &str,
        password_digest: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = self.find_by_email(email).await?;
        Ok(user.filter(|user| {
            constant_time_eq(user.password.as_bytes(), password_digest.as_bytes())
        }))
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a session. Every earlier session of the same user stops being
    /// retrievable once this returns `Ok`; on error nothing is persisted.
    async fn create(&self, session: NewRefreshSession) -> Result<(), StoreError>;

    /// Fetch and consume the session holding `token`.
    ///
    /// A token is honored at most once: of two concurrent calls with the same
    /// value, one gets the session and the other `StoreError::NotFound`.
    async fn get(&self, token: &str) -> Result<RefreshSession, StoreError>;
}
