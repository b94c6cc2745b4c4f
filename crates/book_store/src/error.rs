//! Book store error types.

use thiserror::Error;

/// Errors that can occur during book store operations.
#[derive(Debug, Error)]
pub enum BookStoreError {
    /// Entity not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be turned back into an entity.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Foreign key constraint violation.
    #[error("Foreign key constraint violation: {0}")]
    ForeignKeyViolation(String),
}

impl BookStoreError {
    /// Creates a not found error.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }
}

/// Result type for book store operations.
pub type BookStoreResult<T> = Result<T, BookStoreError>;
