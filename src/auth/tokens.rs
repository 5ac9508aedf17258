//! Access token signing/verification and refresh token generation.
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::config::AuthConfig;
use super::error::AuthError;

/// Raw bytes behind a refresh token; hex encoding doubles the length.
pub const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signer and verifier bound to one deployment secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    ttl: Duration,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.token_secret();
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            validation: Arc::new({
                let mut validation = Validation::new(Algorithm::HS256);
                validation.leeway = 0;
                validation.validate_exp = true;
                validation.set_required_spec_claims(&["exp", "iat", "sub"]);
                validation
            }),
            ttl: Duration::seconds(config.token_ttl_seconds()),
        }
    }

    /// Sign claims for `user_id`, valid from `now` for the configured TTL.
    ///
    /// # Errors
    /// Returns `AuthError::Signing` if encoding fails, `LifetimeOverflow` if
    /// the expiry does not fit the clock.
    pub fn sign(&self, user_id: i64, now: DateTime<Utc>) -> Result<String, AuthError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(AuthError::LifetimeOverflow)?;
        let claims = AccessClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::Signing)
    }

    /// Verify signature, algorithm and expiry, then return the subject as a user id.
    ///
    /// # Errors
    /// Every failure collapses to `AuthError::InvalidToken`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<i64, AuthError> {
        let data =
            jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
                .map_err(|err| {
                    debug!("access token rejected: {err}");
                    AuthError::InvalidToken
                })?;

        if data.header.alg != Algorithm::HS256 {
            return Err(AuthError::InvalidToken);
        }

        // The library check runs too, but only this one honors the caller's clock.
        if data.claims.exp <= now.timestamp() {
            debug!(exp = data.claims.exp, "access token expired");
            return Err(AuthError::InvalidToken);
        }

        data.claims
            .sub
            .parse::<i64>()
            .map_err(|_| AuthError::InvalidToken)
    }
}

/// Fresh opaque refresh token: 32 bytes from the OS RNG, lowercase hex.
///
/// # Errors
/// Returns `AuthError::Random` if the OS random source fails.
pub fn generate_refresh_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(AuthError::Random)?;
    Ok(hex::encode(bytes))
}
