//! Sign-up, sign-in and refresh endpoints.
//!
//! Sign-in and refresh answer with the access token in the JSON body and the
//! refresh token in an `HttpOnly` cookie scoped to `/auth`.

use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{COOKIE, InvalidHeaderValue, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};
use utoipa::ToSchema;

use super::{ErrorResponse, error_response};
use crate::auth::{AuthError, AuthService, TokenPair};
use crate::domain::{SignInInput, SignUpInput};

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";
const REFRESH_COOKIE_PATH: &str = "/auth";

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/auth/sign-up",
    request_body = SignUpInput,
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(auth, payload))]
pub async fn sign_up(
    auth: Extension<AuthService>,
    payload: Option<Json<SignUpInput>>,
) -> Response {
    let Some(Json(input)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "invalid request body").into_response();
    };

    match auth.sign_up(input).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(err) => auth_error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/auth/sign-in",
    request_body = SignInInput,
    responses(
        (status = 200, description = "Signed in; refresh token set as cookie", body = TokenResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "No user with these credentials", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(auth, payload))]
pub async fn sign_in(
    auth: Extension<AuthService>,
    payload: Option<Json<SignInInput>>,
) -> Response {
    let Some(Json(input)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "invalid request body").into_response();
    };

    match auth.sign_in(input).await {
        Ok(pair) => token_response(&auth, pair),
        Err(err) => auth_error_response(&err),
    }
}

#[utoipa::path(
    get,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Tokens rotated; new refresh token set as cookie", body = TokenResponse),
        (status = 400, description = "Refresh cookie missing", body = ErrorResponse),
        (status = 401, description = "Refresh token unknown, used or expired", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn refresh(headers: HeaderMap, auth: Extension<AuthService>) -> Response {
    let Some(token) = extract_refresh_token(&headers) else {
        return error_response(StatusCode::BAD_REQUEST, "refresh token cookie missing")
            .into_response();
    };

    match auth.refresh_tokens(&token).await {
        Ok(pair) => token_response(&auth, pair),
        Err(err) => auth_error_response(&err),
    }
}

fn token_response(auth: &AuthService, pair: TokenPair) -> Response {
    let mut headers = HeaderMap::new();
    match refresh_cookie(auth, &pair.refresh_token) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build refresh cookie: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
                .into_response();
        }
    }
    (
        StatusCode::OK,
        headers,
        Json(TokenResponse {
            token: pair.access_token,
        }),
    )
        .into_response()
}

pub(crate) fn auth_error_response(err: &AuthError) -> Response {
    let status = match err {
        AuthError::Validation(_) => StatusCode::BAD_REQUEST,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::UserExists => StatusCode::CONFLICT,
        AuthError::SessionNotFound | AuthError::RefreshTokenExpired | AuthError::InvalidToken => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::Hashing(_)
        | AuthError::Signing(_)
        | AuthError::LifetimeOverflow
        | AuthError::Random(_)
        | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if err.is_internal() {
        error!("auth request failed: {err}");
        return error_response(status, "internal error").into_response();
    }
    error_response(status, err.to_string()).into_response()
}

/// Build the `HttpOnly` cookie that carries the refresh token.
pub(crate) fn refresh_cookie(
    auth: &AuthService,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = auth.refresh_ttl_seconds();
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={token}; Path={REFRESH_COOKIE_PATH}; HttpOnly; SameSite=Strict; Max-Age={ttl_seconds}"
    );
    if auth.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            let val = val.trim();
            if key.trim() == REFRESH_COOKIE_NAME && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthConfig, NoopAuditSink, SaltedSha256Hasher, StoreError};
    use crate::domain::ValidationError;
    use crate::storage::memory::{MemorySessionStore, MemoryUserStore};
    use anyhow::Result;
    use secrecy::SecretString;
    use std::sync::Arc;

    fn service(secure: bool) -> AuthService {
        AuthService::new(
            Arc::new(MemoryUserStore::default()),
            Arc::new(MemorySessionStore::default()),
            Arc::new(SaltedSha256Hasher::new(SecretString::from("salt".to_string()))),
            Arc::new(NoopAuditSink),
            &AuthConfig::new(SecretString::from("secret".to_string()))
                .with_refresh_ttl_seconds(3600)
                .with_cookie_secure(secure),
        )
    }

    #[test]
    fn refresh_cookie_attributes() -> Result<()> {
        let cookie = refresh_cookie(&service(false), "abc")?;
        assert_eq!(
            cookie.to_str()?,
            "refresh_token=abc; Path=/auth; HttpOnly; SameSite=Strict; Max-Age=3600"
        );
        let cookie = refresh_cookie(&service(true), "abc")?;
        assert!(cookie.to_str()?.ends_with("; Secure"));
        Ok(())
    }

    #[test]
    fn refresh_token_is_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; refresh_token=abc123; other=1"),
        );
        assert_eq!(extract_refresh_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn empty_or_missing_cookie_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_refresh_token(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("refresh_token="));
        assert_eq!(extract_refresh_token(&headers), None);
    }

    #[test]
    fn error_kinds_map_to_statuses() {
        let cases = [
            (
                AuthError::Validation(ValidationError::InvalidEmail),
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::UserNotFound, StatusCode::NOT_FOUND),
            (AuthError::UserExists, StatusCode::CONFLICT),
            (AuthError::SessionNotFound, StatusCode::UNAUTHORIZED),
            (AuthError::RefreshTokenExpired, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidToken, StatusCode::UNAUTHORIZED),
            (
                AuthError::Store(StoreError::NotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(auth_error_response(&err).status(), status);
        }
    }
}
