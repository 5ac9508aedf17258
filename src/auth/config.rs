use secrecy::{ExposeSecret, SecretString};
use std::fmt;

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Upper bound for access token lifetimes (one year).
pub const MAX_TOKEN_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;
/// Upper bound for refresh session lifetimes (five years).
pub const MAX_REFRESH_TTL_SECONDS: i64 = 5 * MAX_TOKEN_TTL_SECONDS;

/// Signing secret and token lifetimes for the auth core.
pub struct AuthConfig {
    token_secret: SecretString,
    token_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    cookie_secure: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self {
            token_secret,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            cookie_secure: false,
        }
    }

    /// Clamped to `1..=MAX_TOKEN_TTL_SECONDS`.
    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds.clamp(1, MAX_TOKEN_TTL_SECONDS);
        self
    }

    /// Clamped to `1..=MAX_REFRESH_TTL_SECONDS`.
    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds.clamp(1, MAX_REFRESH_TTL_SECONDS);
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    pub(super) fn token_secret(&self) -> &[u8] {
        self.token_secret.expose_secret().as_bytes()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"***")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_token_lifetimes() {
        let config = AuthConfig::new(SecretString::from("secret".to_string()));
        assert_eq!(config.token_ttl_seconds(), 900);
        assert_eq!(config.refresh_ttl_seconds(), 2_592_000);
        assert!(!config.cookie_secure());
    }

    #[test]
    fn builders_override_defaults() {
        let config = AuthConfig::new(SecretString::from("secret".to_string()))
            .with_token_ttl_seconds(60)
            .with_refresh_ttl_seconds(120)
            .with_cookie_secure(true);
        assert_eq!(config.token_ttl_seconds(), 60);
        assert_eq!(config.refresh_ttl_seconds(), 120);
        assert!(config.cookie_secure());
        assert_eq!(config.token_secret(), b"secret");
    }

    #[test]
    fn lifetimes_are_clamped() {
        let config = AuthConfig::new(SecretString::from("secret".to_string()))
            .with_token_ttl_seconds(i64::MAX)
            .with_refresh_ttl_seconds(i64::MAX);
        assert_eq!(config.token_ttl_seconds(), MAX_TOKEN_TTL_SECONDS);
        assert_eq!(config.refresh_ttl_seconds(), MAX_REFRESH_TTL_SECONDS);

        let config = AuthConfig::new(SecretString::from("secret".to_string()))
            .with_token_ttl_seconds(-5)
            .with_refresh_ttl_seconds(0);
        assert_eq!(config.token_ttl_seconds(), 1);
        assert_eq!(config.refresh_ttl_seconds(), 1);
    }

    #[test]
    fn debug_masks_secret() {
        let config = AuthConfig::new(SecretString::from("hunter22".to_string()));
        assert!(!format!("{config:?}").contains("hunter22"));
    }
}
