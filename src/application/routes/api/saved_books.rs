use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::info;

use crate::application::auth::AuthenticatedUser;
use crate::application::errors::{ApiError, AppError};
use crate::application::state::AppState;
use crate::domain::books::Book;
use crate::domain::ids::BookId;

#[tracing::instrument(skip(state, auth_user))]
pub(crate) async fn save_book(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<BookId>,
) -> Result<Response, ApiError> {
    let saved = state
        .saved_book_repo
        .insert(auth_user.0.id, id)
        .await
        .map_err(AppError::from)?;

    info!(book_id = %id, "book saved");
    Ok((StatusCode::CREATED, Json(saved)).into_response())
}

#[tracing::instrument(skip(state, auth_user))]
pub(crate) async fn unsave_book(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<BookId>,
) -> Result<StatusCode, ApiError> {
    state
        .saved_book_repo
        .delete(auth_user.0.id, id)
        .await
        .map_err(AppError::from)?;

    info!(book_id = %id, "book unsaved");
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, auth_user))]
pub(crate) async fn list_saved_books(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state
        .saved_book_repo
        .books_for_user(auth_user.0.id)
        .await
        .map_err(AppError::from)?;

    Ok(Json(books))
}
