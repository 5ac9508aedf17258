//! Book CRUD endpoints. Every route requires a bearer access token.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, instrument};

use super::{ErrorResponse, error_response, principal::require_auth};
use crate::auth::AuthService;
use crate::books::{BookError, BookService};
use crate::domain::{Book, NewBook, UpdateBookInput};

#[utoipa::path(
    post,
    path = "/books",
    request_body = NewBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Missing or invalid access token")
    ),
    security(("bearer" = [])),
    tag = "books"
)]
#[instrument(skip_all)]
pub async fn create(
    headers: HeaderMap,
    auth: Extension<AuthService>,
    books: Extension<BookService>,
    payload: Option<Json<NewBook>>,
) -> Response {
    let principal = match require_auth(&headers, &auth) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };
    let Some(Json(input)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "invalid request body").into_response();
    };

    match books.create(input).await {
        Ok(book) => {
            debug!(user_id = principal.user_id, book_id = book.id, "book created");
            (StatusCode::CREATED, Json(book)).into_response()
        }
        Err(err) => book_error_response(&err),
    }
}

#[utoipa::path(
    get,
    path = "/books",
    responses(
        (status = 200, description = "All books", body = [Book]),
        (status = 401, description = "Missing or invalid access token")
    ),
    security(("bearer" = [])),
    tag = "books"
)]
#[instrument(skip_all)]
pub async fn list(
    headers: HeaderMap,
    auth: Extension<AuthService>,
    books: Extension<BookService>,
) -> Response {
    if let Err(status) = require_auth(&headers, &auth) {
        return status.into_response();
    }

    match books.get_all().await {
        Ok(books) => (StatusCode::OK, Json(books)).into_response(),
        Err(err) => book_error_response(&err),
    }
}

#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book", body = Book),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No such book", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "books"
)]
#[instrument(skip(headers, auth, books))]
pub async fn get(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth: Extension<AuthService>,
    books: Extension<BookService>,
) -> Response {
    if let Err(status) = require_auth(&headers, &auth) {
        return status.into_response();
    }
    let Some(id) = parse_id(&id) else {
        return error_response(StatusCode::BAD_REQUEST, "invalid id param").into_response();
    };

    match books.get_by_id(id).await {
        Ok(book) => (StatusCode::OK, Json(book)).into_response(),
        Err(err) => book_error_response(&err),
    }
}

#[utoipa::path(
    put,
    path = "/books/{id}",
    params(("id" = i64, Path, description = "Book id")),
    request_body = UpdateBookInput,
    responses(
        (status = 200, description = "Updated book", body = Book),
        (status = 400, description = "Invalid id or payload", body = ErrorResponse),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No such book", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "books"
)]
#[instrument(skip(headers, auth, books, payload))]
pub async fn update(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth: Extension<AuthService>,
    books: Extension<BookService>,
    payload: Option<Json<UpdateBookInput>>,
) -> Response {
    if let Err(status) = require_auth(&headers, &auth) {
        return status.into_response();
    }
    let Some(id) = parse_id(&id) else {
        return error_response(StatusCode::BAD_REQUEST, "invalid id param").into_response();
    };
    let Some(Json(input)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "invalid request body").into_response();
    };

    match books.update(id, input).await {
        Ok(book) => (StatusCode::OK, Json(book)).into_response(),
        Err(err) => book_error_response(&err),
    }
}

#[utoipa::path(
    delete,
    path = "/books/{id}",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No such book", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "books"
)]
#[instrument(skip(headers, auth, books))]
pub async fn delete(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth: Extension<AuthService>,
    books: Extension<BookService>,
) -> Response {
    if let Err(status) = require_auth(&headers, &auth) {
        return status.into_response();
    }
    let Some(id) = parse_id(&id) else {
        return error_response(StatusCode::BAD_REQUEST, "invalid id param").into_response();
    };

    match books.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => book_error_response(&err),
    }
}

/// Book ids are positive integers.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id > 0)
}

fn book_error_response(err: &BookError) -> Response {
    match err {
        BookError::Validation(err) => {
            error_response(StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
        BookError::NotFound => {
            error_response(StatusCode::NOT_FOUND, err.to_string()).into_response()
        }
        BookError::Store(err) => {
            error!("book request failed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("-3"), None);
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn book_errors_map_to_statuses() {
        assert_eq!(
            book_error_response(&BookError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            book_error_response(&BookError::Validation(
                crate::domain::ValidationError::Required("title")
            ))
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            book_error_response(&BookError::Store(crate::auth::StoreError::Conflict)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
