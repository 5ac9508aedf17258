//! Security audit events.
//!
//! Registration and sign-in hand an `AuditEvent` to an `AuditSink`. Delivery is
//! best effort: the auth core logs a failed `record` and carries on.
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditAction {
    UserRegistered,
    UserSignedIn,
}

impl AuditAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserRegistered => "user_registered",
            Self::UserSignedIn => "user_signed_in",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub user_id: i64,
    pub email: String,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    #[must_use]
    pub fn new(action: AuditAction, user_id: i64, email: &str) -> Self {
        Self {
            action,
            user_id,
            email: email.to_string(),
            occurred_at: Utc::now(),
        }
    }
}

/// Destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one event. Errors are reported to the caller, who only logs them.
    async fn record(&self, event: &AuditEvent) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn record(&self, _event: &AuditEvent) -> Result<()> {
        Ok(())
    }
}
