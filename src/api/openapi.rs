use super::handlers::{ErrorResponse, auth, books, health};
use crate::domain::{Book, NewBook, SignInInput, SignUpInput, UpdateBookInput};
use utoipa::{
    Modify, OpenApi,
    openapi::{
        Contact, InfoBuilder, License,
        security::{Http, HttpAuthScheme, SecurityScheme},
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::sign_up,
        auth::sign_in,
        auth::refresh,
        books::create,
        books::list,
        books::get,
        books::update,
        books::delete,
    ),
    components(schemas(
        ErrorResponse,
        auth::TokenResponse,
        health::Health,
        SignUpInput,
        SignInInput,
        Book,
        NewBook,
        UpdateBookInput,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness and build metadata"),
        (name = "auth", description = "Sign-up, sign-in and refresh token rotation"),
        (name = "books", description = "Book catalogue, bearer token required")
    )
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// `OpenAPI` document for every routed endpoint, with info taken from Cargo.toml.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut openapi = ApiDoc::openapi();
    openapi.info = cargo_info();
    openapi
}

fn cargo_info() -> utoipa::openapi::Info {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();
    info
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match author.split_once('<') {
        Some((name, email)) => (
            Some(name.trim()).filter(|s| !s.is_empty()),
            Some(email.trim_end_matches('>').trim()).filter(|s| !s.is_empty()),
        ),
        None => (Some(author.trim()).filter(|s| !s.is_empty()), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));

        let contact = spec.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Team Cruda"));
            assert_eq!(contact.email.as_deref(), Some("team@cruda.dev"));
        }

        let license = spec.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.name, "BSD-3-Clause");
        }
    }

    #[test]
    fn openapi_paths_and_security() {
        let spec = openapi();
        for path in [
            "/health",
            "/auth/sign-up",
            "/auth/sign-in",
            "/auth/refresh",
            "/books",
            "/books/{id}",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing path {path}");
        }
        let schemes = spec
            .components
            .map(|components| components.security_schemes)
            .unwrap_or_default();
        assert!(schemes.contains_key("bearer"));
    }

    #[test]
    fn parse_author_splits_name_and_email() {
        assert_eq!(
            parse_author("Team Cruda <team@cruda.dev>"),
            (Some("Team Cruda"), Some("team@cruda.dev"))
        );
        assert_eq!(parse_author("Solo"), (Some("Solo"), None));
        assert_eq!(parse_author("<x@y.z>"), (None, Some("x@y.z")));
    }
}
