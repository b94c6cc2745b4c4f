//! User API endpoints.

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
use entities::{User, UserDraft, UserId};
use serde::Deserialize;

use super::MessageResponse;
use crate::error::ServerResult;
use crate::state::AppState;

/// Query selecting a single user.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub id: UserId,
}

/// Registers a user.
pub async fn create_user<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<UserDraft>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(draft) = payload?;
    let user = state.books.create_user(draft).await?;
    let location = format!("/User?id={}", user.id);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(user)))
}

/// Gets a user by ID.
pub async fn get_user<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ServerResult<Json<User>> {
    let Query(query) = query?;
    Ok(Json(state.books.get_user(query.id).await?))
}

/// Deletes a user.
pub async fn delete_user<S: BookStore>(
    State(state): State<Arc<AppState<S>>>,
    path: Result<Path<UserId>, PathRejection>,
) -> ServerResult<Json<MessageResponse>> {
    let Path(id) = path?;
    let message = state.books.delete_user(id).await?;
    Ok(Json(MessageResponse::new(message)))
}
