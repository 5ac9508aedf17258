use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use secrecy::SecretString;
use std::fmt;

use crate::auth::config::{MAX_REFRESH_TTL_SECONDS, MAX_TOKEN_TTL_SECONDS};

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";
pub const ARG_REFRESH_TTL_SECONDS: &str = "refresh-ttl-seconds";
pub const ARG_PASSWORD_SALT: &str = "password-salt";
pub const ARG_COOKIE_SECURE: &str = "cookie-secure";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long(ARG_TOKEN_SECRET)
                .help("HMAC secret used to sign access tokens")
                .env("CRUDA_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long(ARG_TOKEN_TTL_SECONDS)
                .help("Access token TTL in seconds")
                .env("CRUDA_TOKEN_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_SECONDS)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TTL_SECONDS)
                .long(ARG_REFRESH_TTL_SECONDS)
                .help("Refresh session TTL in seconds")
                .env("CRUDA_REFRESH_TTL_SECONDS")
                .default_value("2592000")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_REFRESH_TTL_SECONDS)),
        )
        .arg(
            Arg::new(ARG_PASSWORD_SALT)
                .long(ARG_PASSWORD_SALT)
                .help("Salt mixed into stored password digests")
                .env("CRUDA_PASSWORD_SALT")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long(ARG_COOKIE_SECURE)
                .help("Mark the refresh token cookie as Secure (HTTPS only)")
                .env("CRUDA_COOKIE_SECURE")
                .action(ArgAction::SetTrue),
        )
}

pub struct Options {
    pub token_secret: SecretString,
    pub token_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    pub password_salt: SecretString,
    pub cookie_secure: bool,
}

impl Options {
    /// # Errors
    /// Returns an error if a required secret is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let token_secret = matches
            .get_one::<String>(ARG_TOKEN_SECRET)
            .cloned()
            .context("missing required argument: --token-secret")?;
        let password_salt = matches
            .get_one::<String>(ARG_PASSWORD_SALT)
            .cloned()
            .context("missing required argument: --password-salt")?;

        Ok(Self {
            token_secret: SecretString::from(token_secret),
            token_ttl_seconds: matches
                .get_one::<i64>(ARG_TOKEN_TTL_SECONDS)
                .copied()
                .unwrap_or(900),
            refresh_ttl_seconds: matches
                .get_one::<i64>(ARG_REFRESH_TTL_SECONDS)
                .copied()
                .unwrap_or(2_592_000),
            password_salt: SecretString::from(password_salt),
            cookie_secure: matches.get_flag(ARG_COOKIE_SECURE),
        })
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("token_secret", &"***")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .field("password_salt", &"***")
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}
