//! Store implementations: Postgres for deployments, memory for tests.
use anyhow::{Context, Result};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub mod memory;
pub mod postgres;

pub use memory::{MemoryAuditSink, MemoryBookStore, MemorySessionStore, MemoryUserStore};
pub use postgres::{PgAuditSink, PgBookStore, PgSessionStore, PgUserStore};

/// Open the connection pool shared by the Postgres stores.
///
/// # Errors
/// Returns an error if the database cannot be reached.
pub async fn connect(dsn: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn)
        .await
        .context("Failed to connect to database")
}
