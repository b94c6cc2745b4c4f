//! Server error types.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use book_store::BookStoreError;
use serde_json::json;

use crate::services::book_service::BookServiceError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid request parameters or a rejected state transition.
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] BookStoreError),
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<BookServiceError> for ServerError {
    fn from(error: BookServiceError) -> Self {
        match error {
            BookServiceError::NotFound(msg) => ServerError::NotFound(msg.to_string()),
            BookServiceError::Conflict(msg)
            | BookServiceError::InvalidArgument(msg)
            | BookServiceError::InvalidState(msg) => ServerError::BadRequest(msg.to_string()),
            BookServiceError::Validation(msg) => ServerError::BadRequest(msg),
            BookServiceError::Store(BookStoreError::NotFound { entity_type, .. }) => {
                ServerError::NotFound(format!("{entity_type} does not exist."))
            }
            BookServiceError::Store(BookStoreError::ForeignKeyViolation(msg)) => {
                ServerError::BadRequest(msg)
            }
            BookServiceError::Store(e) => ServerError::Database(e),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServerError::Database(e) => {
                tracing::error!(error = %e, "Store operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
