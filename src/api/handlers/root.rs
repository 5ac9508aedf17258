use axum::response::IntoResponse;

use crate::{APP_USER_AGENT, GIT_COMMIT_HASH};

// axum handler for the banner at "/"
pub async fn root() -> impl IntoResponse {
    format!("{APP_USER_AGENT} ({GIT_COMMIT_HASH})")
}
