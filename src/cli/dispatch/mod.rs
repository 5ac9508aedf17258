//! Map validated CLI arguments to an action.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_DSN, ARG_PORT, auth};
use anyhow::{Context, Result, bail};
use url::Url;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or the DSN is not a Postgres URL.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .context("missing required argument: --dsn")?;
    let dsn = parse_dsn(dsn)?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        token_secret: auth_opts.token_secret,
        token_ttl_seconds: auth_opts.token_ttl_seconds,
        refresh_ttl_seconds: auth_opts.refresh_ttl_seconds,
        password_salt: auth_opts.password_salt,
        cookie_secure: auth_opts.cookie_secure,
    }))
}

fn parse_dsn(dsn: &str) -> Result<Url> {
    let url = Url::parse(dsn).context("invalid CRUDA_DSN")?;
    if !matches!(url.scheme(), "postgres" | "postgresql") {
        bail!("invalid CRUDA_DSN: expected a postgres:// URL");
    }
    Ok(url)
}
