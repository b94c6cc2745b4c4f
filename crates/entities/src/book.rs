//! Book-related entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::UserId;

/// Identifier assigned to a book by the store.
pub type BookId = i64;

/// Whether a book is on the shelf or lent out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    /// Nobody holds the book.
    Available,
    /// The book is lent to a user until its due date.
    Borrowed,
}

/// A book in the catalog.
///
/// `borrowed_by` and `until` are either both set or both unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier (0 until the store assigns one).
    pub id: BookId,
    /// Display name.
    pub name: String,
    /// The user currently holding the book.
    pub borrowed_by: Option<UserId>,
    /// When the book is due back.
    pub until: Option<DateTime<Utc>>,
}

impl Book {
    /// Creates a new, available book.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            borrowed_by: None,
            until: None,
        }
    }

    /// Marks the book as lent to `user_id` until `until`.
    pub fn with_loan(mut self, user_id: UserId, until: DateTime<Utc>) -> Self {
        self.borrowed_by = Some(user_id);
        self.until = Some(until);
        self
    }

    /// Returns the current lending status.
    pub fn status(&self) -> BookStatus {
        if self.borrowed_by.is_some() {
            BookStatus::Borrowed
        } else {
            BookStatus::Available
        }
    }

    /// Returns true if the book is held by `user_id`.
    pub fn is_held_by(&self, user_id: UserId) -> bool {
        self.borrowed_by == Some(user_id)
    }
}

/// Client-supplied values for creating or overwriting a book.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_loan_fields"))]
pub struct BookDraft {
    #[validate(length(min = 1, max = 20, message = "Name must be between 1 and 20 characters."))]
    pub name: String,
    /// Id of the borrowing user.
    #[serde(default)]
    pub borrowed_by: Option<UserId>,
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
}

impl BookDraft {
    /// Creates a draft for an available book.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            borrowed_by: None,
            until: None,
        }
    }

    /// Converts the draft into a book with the given id.
    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            name: self.name,
            borrowed_by: self.borrowed_by,
            until: self.until,
        }
    }
}

fn validate_loan_fields(draft: &BookDraft) -> Result<(), ValidationError> {
    if draft.borrowed_by.is_some() != draft.until.is_some() {
        return Err(ValidationError::new("loan_fields")
            .with_message("borrowedBy and until must be set together.".into()));
    }
    Ok(())
}
