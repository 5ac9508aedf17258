//! Credential digests.
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::fmt;

/// Deterministic `plaintext -> digest` mapping used both to store and to
/// compare credentials.
pub trait PasswordHasher: Send + Sync {
    /// # Errors
    /// Returns an error if the digest cannot be computed.
    fn hash(&self, password: &str) -> Result<String>;
}

/// Hex encoded `SHA-256(salt || password)`.
#[derive(Clone)]
pub struct SaltedSha256Hasher {
    salt: SecretString,
}

impl SaltedSha256Hasher {
    #[must_use]
    pub fn new(salt: SecretString) -> Self {
        Self { salt }
    }
}

impl fmt::Debug for SaltedSha256Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaltedSha256Hasher")
            .field("salt", &"***")
            .finish()
    }
}

impl PasswordHasher for SaltedSha256Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.expose_secret().as_bytes());
        hasher.update(password.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Compare two byte strings without an early exit on the first mismatch.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher(salt: &str) -> SaltedSha256Hasher {
        SaltedSha256Hasher::new(SecretString::from(salt.to_string()))
    }

    #[test]
    fn hash_is_deterministic_hex() -> Result<()> {
        let first = hasher("pepper").hash("secret1")?;
        let second = hasher("pepper").hash("secret1")?;
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        Ok(())
    }

    #[test]
    fn salt_changes_digest() -> Result<()> {
        assert_ne!(hasher("a").hash("secret1")?, hasher("b").hash("secret1")?);
        Ok(())
    }

    #[test]
    fn debug_masks_salt() {
        assert!(!format!("{:?}", hasher("pepper")).contains("pepper"));
    }

    #[test]
    fn constant_time_eq_matches_plain_equality() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(constant_time_eq(b"", b""));
    }
}
