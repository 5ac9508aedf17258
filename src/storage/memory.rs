//! In-memory stores backing the unit and router test suites.
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::auth::{AuditEvent, AuditSink, SessionStore, StoreError, UserStore};
use crate::books::BookStore;
use crate::domain::{
    Book, NewBook, NewRefreshSession, NewUser, RefreshSession, UpdateBookInput, User,
};

#[derive(Debug, Default)]
struct Users {
    next_id: i64,
    by_email: HashMap<String, User>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryUserStore {
    inner: Arc<RwLock<Users>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<(), StoreError> {
        let mut users = self.inner.write().await;
        if users.by_email.contains_key(&user.email) {
            return Err(StoreError::Conflict);
        }
        users.next_id += 1;
        let id = users.next_id;
        users.by_email.insert(
            user.email.clone(),
            User {
                id,
                name: user.name,
                email: user.email,
                password: user.password,
                registered_at: user.registered_at,
            },
        );
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.by_email.get(email).cloned())
    }
}

#[derive(Debug, Default)]
struct Sessions {
    next_id: i64,
    by_token: HashMap<String, RefreshSession>,
}

/// Session store whose `create` and `get` run under one lock, so rotation and
/// consumption are atomic with respect to each other.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    inner: Arc<Mutex<Sessions>>,
}

impl MemorySessionStore {
    /// Live sessions held for `user_id`.
    pub async fn count_for_user(&self, user_id: i64) -> usize {
        self.inner
            .lock()
            .await
            .by_token
            .values()
            .filter(|session| session.user_id == user_id)
            .count()
    }

    /// Insert a session as-is, bypassing rotation. Used to stage expired sessions.
    pub async fn insert_raw(&self, session: NewRefreshSession) {
        let mut sessions = self.inner.lock().await;
        sessions.next_id += 1;
        let id = sessions.next_id;
        sessions.by_token.insert(
            session.token.clone(),
            RefreshSession {
                id,
                user_id: session.user_id,
                token: session.token,
                expires_at: session.expires_at,
            },
        );
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: NewRefreshSession) -> Result<(), StoreError> {
        let mut sessions = self.inner.lock().await;
        if sessions.by_token.contains_key(&session.token) {
            return Err(StoreError::Conflict);
        }
        sessions
            .by_token
            .retain(|_, existing| existing.user_id != session.user_id);
        sessions.next_id += 1;
        let id = sessions.next_id;
        sessions.by_token.insert(
            session.token.clone(),
            RefreshSession {
                id,
                user_id: session.user_id,
                token: session.token,
                expires_at: session.expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<RefreshSession, StoreError> {
        let mut sessions = self.inner.lock().await;
        let session = sessions.by_token.remove(token).ok_or(StoreError::NotFound)?;
        sessions
            .by_token
            .retain(|_, existing| existing.user_id != session.user_id);
        Ok(session)
    }
}

#[derive(Debug, Default)]
struct Books {
    next_id: i64,
    by_id: BTreeMap<i64, Book>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryBookStore {
    inner: Arc<RwLock<Books>>,
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let mut books = self.inner.write().await;
        books.next_id += 1;
        let record = Book {
            id: books.next_id,
            title: book.title,
            author: book.author,
            publish_date: book.publish_date.unwrap_or_else(chrono::Utc::now),
            rating: book.rating,
        };
        books.by_id.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>, StoreError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.inner.read().await.by_id.values().cloned().collect())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .by_id
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, id: i64, input: UpdateBookInput) -> Result<Book, StoreError> {
        let mut books = self.inner.write().await;
        let book = books.by_id.get_mut(&id).ok_or(StoreError::NotFound)?;
        input.apply(book);
        Ok(book.clone())
    }
}

/// Audit sink that keeps every event it receives.
#[derive(Debug, Default, Clone)]
pub struct MemoryAuditSink {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: "digest".to_string(),
            registered_at: Utc::now(),
        }
    }

    fn new_session(user_id: i64, token: &str) -> NewRefreshSession {
        NewRefreshSession {
            user_id,
            token: token.to_string(),
            expires_at: Utc::now() + Duration::days(30),
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() -> Result<()> {
        let store = MemoryUserStore::default();
        store.create(new_user("a@example.com")).await?;
        assert!(matches!(
            store.create(new_user("a@example.com")).await,
            Err(StoreError::Conflict)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn find_by_credential_compares_digest() -> Result<()> {
        let store = MemoryUserStore::default();
        store.create(new_user("a@example.com")).await?;
        assert!(store
            .find_by_credential("a@example.com", "digest")
            .await?
            .is_some());
        assert!(store
            .find_by_credential("a@example.com", "other")
            .await?
            .is_none());
        assert!(store
            .find_by_credential("b@example.com", "digest")
            .await?
            .is_none());
        Ok(())
    }

    #[tokio::test]
    async fn create_supersedes_prior_sessions() -> Result<()> {
        let store = MemorySessionStore::default();
        store.create(new_session(1, "first")).await?;
        store.create(new_session(2, "other-user")).await?;
        store.create(new_session(1, "second")).await?;

        assert!(matches!(store.get("first").await, Err(StoreError::NotFound)));
        assert_eq!(store.count_for_user(1).await, 1);
        assert_eq!(store.count_for_user(2).await, 1);
        assert_eq!(store.get("second").await?.user_id, 1);
        Ok(())
    }

    #[tokio::test]
    async fn get_consumes_session() -> Result<()> {
        let store = MemorySessionStore::default();
        store.create(new_session(1, "token")).await?;
        assert_eq!(store.get("token").await?.user_id, 1);
        assert!(matches!(store.get("token").await, Err(StoreError::NotFound)));
        assert_eq!(store.count_for_user(1).await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_gets_yield_one_session() -> Result<()> {
        let store = MemorySessionStore::default();
        store.create(new_session(1, "token")).await?;
        let (a, b) = tokio::join!(store.get("token"), store.get("token"));
        assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
        Ok(())
    }

    #[tokio::test]
    async fn book_ids_are_sequential() -> Result<()> {
        let store = MemoryBookStore::default();
        for title in ["One", "Two"] {
            store
                .create(NewBook {
                    title: title.to_string(),
                    author: "Anon".to_string(),
                    publish_date: None,
                    rating: 0,
                })
                .await?;
        }
        let ids: Vec<i64> = store.get_all().await?.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
        Ok(())
    }
}
