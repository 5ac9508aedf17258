//! Authentication core: sign-up, sign-in, refresh rotation and access token
//! verification.
//!
//! The core holds no mutable state. Users and refresh sessions live behind
//! `UserStore` and `SessionStore`; single-use refresh tokens and "one live
//! session per user" are guaranteed by the session store's atomic `create` and
//! `get`, not by locking here.

pub mod audit;
pub mod config;
pub mod error;
pub mod hasher;
pub mod store;
pub mod tokens;

pub use audit::{AuditAction, AuditEvent, AuditSink, NoopAuditSink};
pub use config::AuthConfig;
pub use error::{AuthError, StoreError};
pub use hasher::{PasswordHasher, SaltedSha256Hasher};
pub use store::{SessionStore, UserStore};
pub use tokens::{AccessClaims, TokenSigner, generate_refresh_token};

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::domain::{NewRefreshSession, NewUser, SignInInput, SignUpInput, normalize_email};

/// Access token plus the refresh token that rotates it.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: Arc<dyn PasswordHasher>,
    audit: Arc<dyn AuditSink>,
    signer: TokenSigner,
    refresh_ttl: Duration,
    cookie_secure: bool,
}

impl AuthService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<dyn PasswordHasher>,
        audit: Arc<dyn AuditSink>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            audit,
            signer: TokenSigner::new(config),
            refresh_ttl: Duration::seconds(config.refresh_ttl_seconds()),
            cookie_secure: config.cookie_secure(),
        }
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl.num_seconds()
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    /// Register a user.
    ///
    /// # Errors
    /// `Validation` for bad input, `UserExists` for a taken email, `Hashing`
    /// or `Store` for infrastructure failures. Audit failures are only logged.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn sign_up(&self, input: SignUpInput) -> Result<(), AuthError> {
        input.validate()?;
        let email = normalize_email(&input.email);
        let digest = self
            .hasher
            .hash(&input.password)
            .map_err(AuthError::Hashing)?;

        let user = NewUser {
            name: input.name.trim().to_string(),
            email: email.clone(),
            password: digest.clone(),
            registered_at: Utc::now(),
        };
        self.users.create(user).await.map_err(|err| match err {
            StoreError::Conflict => AuthError::UserExists,
            other => AuthError::Store(other),
        })?;
        info!("user registered");

        match self.users.find_by_credential(&email, &digest).await {
            Ok(Some(user)) => {
                self.emit(AuditEvent::new(
                    AuditAction::UserRegistered,
                    user.id,
                    &user.email,
                ))
                .await;
            }
            Ok(None) => error!("registered user not found for audit"),
            Err(err) => error!("failed to load registered user for audit: {err}"),
        }

        Ok(())
    }

    /// Check credentials and issue a token pair.
    ///
    /// A wrong password and an unknown email both yield `UserNotFound`.
    ///
    /// # Errors
    /// `Validation`, `UserNotFound`, or any issuance failure.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn sign_in(&self, input: SignInInput) -> Result<TokenPair, AuthError> {
        input.validate()?;
        let email = normalize_email(&input.email);
        let digest = self
            .hasher
            .hash(&input.password)
            .map_err(AuthError::Hashing)?;

        let Some(user) = self.users.find_by_credential(&email, &digest).await? else {
            debug!("credential lookup missed");
            return Err(AuthError::UserNotFound);
        };

        let pair = self.issue_tokens(user.id).await?;
        self.emit(AuditEvent::new(
            AuditAction::UserSignedIn,
            user.id,
            &user.email,
        ))
        .await;
        Ok(pair)
    }

    /// Consume a refresh token and rotate it into a new pair.
    ///
    /// # Errors
    /// `SessionNotFound` for an unknown or already used token,
    /// `RefreshTokenExpired` for a session past its expiry.
    #[instrument(skip_all)]
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let session = self
            .sessions
            .get(refresh_token)
            .await
            .map_err(|err| match err {
                StoreError::NotFound => AuthError::SessionNotFound,
                other => AuthError::Store(other),
            })?;

        if session.is_expired(Utc::now()) {
            debug!(user_id = session.user_id, "refresh session expired");
            return Err(AuthError::RefreshTokenExpired);
        }

        self.issue_tokens(session.user_id).await
    }

    /// Resolve the user id behind an access token without touching a store.
    ///
    /// # Errors
    /// `InvalidToken` for any signature, algorithm, expiry or claim failure.
    pub fn parse_token(&self, token: &str) -> Result<i64, AuthError> {
        self.signer.verify(token, Utc::now())
    }

    async fn issue_tokens(&self, user_id: i64) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.refresh_ttl)
            .ok_or(AuthError::LifetimeOverflow)?;
        let access_token = self.signer.sign(user_id, now)?;
        let refresh_token = generate_refresh_token()?;

        self.sessions
            .create(NewRefreshSession {
                user_id,
                token: refresh_token.clone(),
                expires_at,
            })
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    async fn emit(&self, event: AuditEvent) {
        if let Err(err) = self.audit.record(&event).await {
            error!(audit.action = %event.action, "failed to record audit event: {err:#}");
        }
    }
}
