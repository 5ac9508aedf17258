//! Book catalogue behind the authenticated `/books` routes.
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

use crate::auth::StoreError;
use crate::domain::{Book, NewBook, UpdateBookInput, ValidationError};

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn create(&self, book: NewBook) -> Result<Book, StoreError>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Book>, StoreError>;
    async fn get_all(&self) -> Result<Vec<Book>, StoreError>;
    /// Returns `StoreError::NotFound` when no row was deleted.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
    /// Returns `StoreError::NotFound` when no row was updated.
    async fn update(&self, id: i64, input: UpdateBookInput) -> Result<Book, StoreError>;
}

#[derive(Debug, Error)]
pub enum BookError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("book not found")]
    NotFound,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for BookError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn BookStore>,
}

impl BookService {
    #[must_use]
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// # Errors
    /// `Validation` for a blank title or author, `Store` otherwise.
    #[instrument(skip(self, input))]
    pub async fn create(&self, mut input: NewBook) -> Result<Book, BookError> {
        input.validate()?;
        if input.publish_date.is_none() {
            input.publish_date = Some(Utc::now());
        }
        Ok(self.store.create(input).await?)
    }

    /// # Errors
    /// `NotFound` when no book has `id`.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> Result<Book, BookError> {
        self.store.get_by_id(id).await?.ok_or(BookError::NotFound)
    }

    /// # Errors
    /// Propagates store failures.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Book>, BookError> {
        Ok(self.store.get_all().await?)
    }

    /// # Errors
    /// `NotFound` when no book has `id`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), BookError> {
        Ok(self.store.delete(id).await?)
    }

    /// Apply a partial update. An empty update returns the current record.
    ///
    /// # Errors
    /// `Validation` for a blank title or author, `NotFound` when no book has `id`.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i64, input: UpdateBookInput) -> Result<Book, BookError> {
        input.validate()?;
        if input.is_empty() {
            return self.get_by_id(id).await;
        }
        Ok(self.store.update(id, input).await?)
    }
}
