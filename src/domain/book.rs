use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{self, ValidationError};

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub publish_date: DateTime<Utc>,
    pub rating: i32,
}

/// Payload for creating a book. A missing `publish_date` defaults to now.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rating: i32,
}

impl NewBook {
    /// # Errors
    /// Returns an error when the title or author is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require("title", &self.title)?;
        validation::require("author", &self.author)
    }
}

/// Partial update; only the fields that are present get written.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBookInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rating: Option<i32>,
}

impl UpdateBookInput {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.publish_date.is_none()
            && self.rating.is_none()
    }

    /// # Errors
    /// Returns an error when a provided title or author is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            validation::require("title", title)?;
        }
        if let Some(author) = &self.author {
            validation::require("author", author)?;
        }
        Ok(())
    }

    /// Write the present fields onto `book`.
    pub fn apply(&self, book: &mut Book) {
        if let Some(title) = &self.title {
            book.title.clone_from(title);
        }
        if let Some(author) = &self.author {
            book.author.clone_from(author);
        }
        if let Some(publish_date) = self.publish_date {
            book.publish_date = publish_date;
        }
        if let Some(rating) = self.rating {
            book.rating = rating;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn book() -> Book {
        Book {
            id: 1,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            publish_date: Utc::now(),
            rating: 4,
        }
    }

    #[test]
    fn new_book_without_publish_date_deserializes() -> Result<()> {
        let input: NewBook =
            serde_json::from_str(r#"{"title":"Dune","author":"Frank Herbert","rating":5}"#)?;
        assert_eq!(input.publish_date, None);
        assert_eq!(input.rating, 5);
        assert_eq!(input.validate(), Ok(()));
        Ok(())
    }

    #[test]
    fn new_book_requires_title() {
        let input = NewBook {
            title: " ".to_string(),
            author: "Frank Herbert".to_string(),
            publish_date: None,
            rating: 0,
        };
        assert_eq!(input.validate(), Err(ValidationError::Required("title")));
    }

    #[test]
    fn update_applies_only_present_fields() {
        let mut target = book();
        let original_date = target.publish_date;
        let update = UpdateBookInput {
            rating: Some(5),
            ..UpdateBookInput::default()
        };
        update.apply(&mut target);
        assert_eq!(target.rating, 5);
        assert_eq!(target.title, "Dune");
        assert_eq!(target.publish_date, original_date);
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(UpdateBookInput::default().is_empty());
        assert!(!UpdateBookInput {
            title: Some("Emma".to_string()),
            ..UpdateBookInput::default()
        }
        .is_empty());
    }
}
