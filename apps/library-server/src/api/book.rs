//! Book and loan API endpoints.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use book_store::BookStore;
use entities::{BookDraft, BookId, UserId};
use serde::Deserialize;

use super::MessageResponse;
use crate::error::ServerResult;
use crate::services::book_service::BookDetails;
use crate::state::AppState;

/// Query selecting a single book.
#[derive(Debug, Deserialize)]
pub struct BookQuery {
    pub id: BookId,
}

/// Query for lending a book.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowQuery {
    pub book_id: BookId,
    pub user_id: UserId,
    /// Loan length in days.
    pub until: i64,
}

/// Query for returning a book.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnQuery {
    pub book_id: BookId,
    pub user_id: UserId,
}

/// Creates a book.
pub async fn create_book<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<BookDraft>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(draft) = payload?;
    let book = state.books.create(draft).await?;
    let location = format!("/Book?id={}", book.id);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(book)))
}

/// Gets a book by ID.
pub async fn get_book<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<BookQuery>, QueryRejection>,
) -> ServerResult<Json<BookDetails>> {
    let Query(query) = query?;
    Ok(Json(state.books.get_by_id(query.id).await?))
}

/// Overwrites a book.
pub async fn update_book<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    path: Result<Path<BookId>, PathRejection>,
    payload: Result<Json<BookDraft>, JsonRejection>,
) -> ServerResult<Json<MessageResponse>> {
    let Path(id) = path?;
    let Json(draft) = payload?;
    let message = state.books.update_book(id, draft).await?;
    Ok(Json(MessageResponse::new(message)))
}

/// Deletes a book.
pub async fn delete_book<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    path: Result<Path<BookId>, PathRejection>,
) -> ServerResult<Json<MessageResponse>> {
    let Path(id) = path?;
    let message = state.books.delete_by_id(id).await?;
    Ok(Json(MessageResponse::new(message)))
}

/// Lends a book to a user.
pub async fn borrow_book<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<BorrowQuery>, QueryRejection>,
) -> ServerResult<Json<MessageResponse>> {
    let Query(query) = query?;
    let message = state
        .books
        .borrow_book(query.book_id, query.user_id, query.until)
        .await?;
    Ok(Json(MessageResponse::new(message)))
}

/// Takes a book back from a user.
pub async fn return_book<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<ReturnQuery>, QueryRejection>,
) -> ServerResult<Json<MessageResponse>> {
    let Query(query) = query?;
    let message = state.books.return_book(query.book_id, query.user_id).await?;
    Ok(Json(MessageResponse::new(message)))
}

/// Lists the emails of borrowers whose books are due within a day.
pub async fn check_notices<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ServerResult<Json<Vec<String>>> {
    Ok(Json(state.books.notices().await?))
}
