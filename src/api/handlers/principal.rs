//! Bearer token extraction for the protected routes.

use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use tracing::debug;

use crate::auth::AuthService;

/// Caller identity resolved from a valid access token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
}

/// Resolve the `Authorization: Bearer` header into a principal, or 401.
pub fn require_auth(headers: &HeaderMap, auth: &AuthService) -> Result<Principal, StatusCode> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    match auth.parse_token(&token) {
        Ok(user_id) => Ok(Principal { user_id }),
        Err(err) => {
            debug!("rejected bearer token: {err}");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
