//! API endpoints.

pub mod book;
pub mod user;

use std::sync::Arc;

use axum::{
    routing::{delete, get, put},
    Router,
};
use book_store::BookStore;
use serde::Serialize;

use crate::state::AppState;

/// Body of a successful mutation.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Creates the API router with all endpoints.
pub fn create_router<S: BookStore + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        // Book endpoints
        .route("/Book", get(book::get_book).post(book::create_book))
        .route("/Book/borrowbook", put(book::borrow_book))
        .route("/Book/returnbook", put(book::return_book))
        .route("/Book/checknotices", get(book::check_notices))
        .route("/Book/:id", put(book::update_book).delete(book::delete_book))
        // User endpoints
        .route("/User", get(user::get_user).post(user::create_user))
        .route("/User/:id", delete(user::delete_user))
        // Health check
        .route("/health", get(health_check))
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
