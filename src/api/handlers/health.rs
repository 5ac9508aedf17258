use crate::GIT_COMMIT_HASH;
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgPool};
use tracing::{Instrument, debug, error, info_span};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: String,
}

/// Database handle for the readiness probe; `None` when running on memory stores.
#[derive(Clone, Debug, Default)]
pub struct HealthProbe(pub Option<PgPool>);

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Service and database are healthy", body = [Health]),
        (status = 503, description = "Database is unhealthy", body = [Health])
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health(method: Method, probe: Extension<HealthProbe>) -> impl IntoResponse {
    let database = match &probe.0.0 {
        Some(pool) => ping(pool).await,
        None => DatabaseStatus::Memory,
    };

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.as_str().to_string(),
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);
            let mut headers = HeaderMap::new();
            headers.insert("X-App", x_app_header_value);
            headers
        })
        .unwrap_or_else(|err| {
            error!("Failed to parse X-App header: {}", err);
            HeaderMap::new()
        });

    if database == DatabaseStatus::Error {
        (StatusCode::SERVICE_UNAVAILABLE, headers, body)
    } else {
        (StatusCode::OK, headers, body)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DatabaseStatus {
    Ok,
    Error,
    Memory,
}

impl DatabaseStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Memory => "memory",
        }
    }
}

async fn ping(pool: &PgPool) -> DatabaseStatus {
    let acquire_span = info_span!(
        "db.acquire",
        db.system = "postgresql",
        db.operation = "ACQUIRE"
    );
    let mut conn = match pool.acquire().instrument(acquire_span).await {
        Ok(conn) => conn,
        Err(error) => {
            error!("Failed to acquire database connection: {}", error);
            return DatabaseStatus::Error;
        }
    };

    let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
    match conn.ping().instrument(ping_span).await {
        Ok(()) => {
            debug!("Database connection is healthy");
            DatabaseStatus::Ok
        }
        Err(error) => {
            error!("Failed to ping database: {}", error);
            DatabaseStatus::Error
        }
    }
}
