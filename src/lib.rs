//! # Cruda (book catalogue behind token authentication)
//!
//! `cruda` serves CRUD operations over books. Every book route requires a
//! bearer access token issued by the auth core.
//!
//! ## Tokens
//!
//! - **Access token:** HS256 JWT carrying `{sub, iat, exp}`. Verified purely by
//!   signature and expiry, no store lookup.
//! - **Refresh token:** 64 lowercase hex characters (32 bytes from the OS RNG),
//!   handed to clients in an `HttpOnly` cookie. Each refresh token is single use;
//!   presenting it rotates the pair and the old value is never honored again.
//!
//! At most one refresh session per user is valid at any time. Signing in or
//! refreshing supersedes whatever session the user had before.
//!
//! ## Stores
//!
//! The auth core only talks to capability traits (`UserStore`, `SessionStore`,
//! `PasswordHasher`, `AuditSink`). Postgres and in-memory implementations live in
//! [`storage`].

pub mod api;
pub mod auth;
pub mod books;
pub mod cli;
pub mod domain;
pub mod storage;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
