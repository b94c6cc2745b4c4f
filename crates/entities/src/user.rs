//! User-related entity definitions.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::BookId;

/// Identifier assigned to a user by the store.
pub type UserId = i64;

/// A library member who can borrow books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier (0 until the store assigns one).
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address notices are sent to.
    pub email: String,
    /// Books currently held by this user.
    ///
    /// Derived from each book's borrower by the store; never written directly.
    #[serde(default)]
    pub borrowed_books: Vec<BookId>,
}

impl User {
    /// Creates a new user.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: email.into(),
            borrowed_books: Vec::new(),
        }
    }

    /// Returns true if the user currently holds `book_id`.
    pub fn holds(&self, book_id: BookId) -> bool {
        self.borrowed_books.contains(&book_id)
    }
}

/// Client-supplied values for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    #[validate(length(min = 1, max = 10, message = "Name must be between 1 and 10 characters."))]
    pub name: String,
    #[validate(
        email(message = "Invalid email address."),
        length(max = 20, message = "Email must be at most 20 characters.")
    )]
    pub email: String,
}

impl UserDraft {
    /// Creates a new user draft.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Converts the draft into a user with the given id and no books.
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            ..User::new(self.name, self.email)
        }
    }
}
