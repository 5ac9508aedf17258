//! Postgres-backed stores. Schema lives in `sql/schema.sql`.
use anyhow::{Context, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{Instrument, Span, debug, info_span};

use crate::auth::{AuditEvent, AuditSink, SessionStore, StoreError, UserStore};
use crate::books::BookStore;
use crate::domain::{
    Book, NewBook, NewRefreshSession, NewUser, RefreshSession, UpdateBookInput, User,
};

fn query_span(operation: &'static str, statement: &'static str) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

/// Refresh tokens are stored as their SHA-256 digest, never in the clear.
fn hash_refresh_token(token: &str) -> Vec<u8> {
    Sha256::digest(token.as_bytes()).to_vec()
}

#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<(), StoreError> {
        let query = r"
            INSERT INTO users
                (name, email, password, registered_at)
            VALUES ($1, $2, $3, $4)
        ";
        sqlx::query(query)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password)
            .bind(user.registered_at)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = "SELECT id, name, email, password, registered_at FROM users WHERE email = $1";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;

        Ok(row.map(|row| User {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password: row.get("password"),
            registered_at: row.get("registered_at"),
        }))
    }
}

#[derive(Clone, Debug)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, session: NewRefreshSession) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent issuance for one user on the user row.
        let query = "SELECT id FROM users WHERE id = $1 FOR UPDATE";
        sqlx::query(query)
            .bind(session.user_id)
            .fetch_one(&mut *tx)
            .instrument(query_span("SELECT", query))
            .await?;

        let query = "DELETE FROM refresh_sessions WHERE user_id = $1";
        sqlx::query(query)
            .bind(session.user_id)
            .execute(&mut *tx)
            .instrument(query_span("DELETE", query))
            .await?;

        let query = r"
            INSERT INTO refresh_sessions
                (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
        ";
        sqlx::query(query)
            .bind(session.user_id)
            .bind(hash_refresh_token(&session.token))
            .bind(session.expires_at)
            .execute(&mut *tx)
            .instrument(query_span("INSERT", query))
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<RefreshSession, StoreError> {
        let mut tx = self.pool.begin().await?;

        // DELETE ... RETURNING makes the read single-use: a concurrent caller
        // blocks on the row lock and then sees zero rows.
        let query = r"
            DELETE FROM refresh_sessions
            WHERE token_hash = $1
            RETURNING id, user_id, expires_at
        ";
        let Some(row) = sqlx::query(query)
            .bind(hash_refresh_token(token))
            .fetch_optional(&mut *tx)
            .instrument(query_span("DELETE", query))
            .await?
        else {
            tx.rollback().await?;
            return Err(StoreError::NotFound);
        };

        let session = RefreshSession {
            id: row.get("id"),
            user_id: row.get("user_id"),
            token: token.to_string(),
            expires_at: row.get("expires_at"),
        };

        let query = "DELETE FROM refresh_sessions WHERE user_id = $1";
        sqlx::query(query)
            .bind(session.user_id)
            .execute(&mut *tx)
            .instrument(query_span("DELETE", query))
            .await?;

        tx.commit().await?;
        Ok(session)
    }
}

#[derive(Clone, Debug)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn book_from_row(row: &PgRow) -> Book {
    Book {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        publish_date: row.get("publish_date"),
        rating: row.get("rating"),
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let query = r"
            INSERT INTO books
                (title, author, publish_date, rating)
            VALUES ($1, $2, COALESCE($3, NOW()), $4)
            RETURNING id, title, author, publish_date, rating
        ";
        let row = sqlx::query(query)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.publish_date)
            .bind(book.rating)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", query))
            .await?;
        Ok(book_from_row(&row))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let query = "SELECT id, title, author, publish_date, rating FROM books WHERE id = $1";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        Ok(row.as_ref().map(book_from_row))
    }

    async fn get_all(&self) -> Result<Vec<Book>, StoreError> {
        let query = "SELECT id, title, author, publish_date, rating FROM books ORDER BY id";
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        Ok(rows.iter().map(book_from_row).collect())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let query = "DELETE FROM books WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update(&self, id: i64, input: UpdateBookInput) -> Result<Book, StoreError> {
        let query = r"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                publish_date = COALESCE($4, publish_date),
                rating = COALESCE($5, rating)
            WHERE id = $1
            RETURNING id, title, author, publish_date, rating
        ";
        let row = sqlx::query(query)
            .bind(id)
            .bind(input.title)
            .bind(input.author)
            .bind(input.publish_date)
            .bind(input.rating)
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await?;
        row.as_ref().map(book_from_row).ok_or(StoreError::NotFound)
    }
}

/// Audit sink that appends to the `audit_events` table.
#[derive(Clone, Debug)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<()> {
        let query = r"
            INSERT INTO audit_events
                (action, user_id, email, occurred_at)
            VALUES ($1, $2, $3, $4)
        ";
        sqlx::query(query)
            .bind(event.action.as_str())
            .bind(event.user_id)
            .bind(&event.email)
            .bind(event.occurred_at)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .context("failed to insert audit event")?;
        debug!(audit.action = %event.action, user_id = event.user_id, "audit event recorded");
        Ok(())
    }
}
