use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::info;

use crate::application::auth::AuthenticatedUser;
use crate::application::errors::{ApiError, AppError};
use crate::application::state::AppState;
use crate::domain::comments::{BookComment, NewComment};
use crate::domain::ids::BookId;

#[derive(Debug, Deserialize)]
pub(crate) struct CommentSubmission {
    text: String,
}

#[tracing::instrument(skip(state, auth_user, submission))]
pub(crate) async fn create_comment(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<BookId>,
    Json(submission): Json<CommentSubmission>,
) -> Result<Response, ApiError> {
    let new_comment = NewComment {
        user_id: auth_user.0.id,
        book_id: id,
        text: submission.text,
    }
    .normalize();

    if new_comment.text.is_empty() {
        return Err(AppError::validation("comment text must not be empty").into());
    }

    let comment = state
        .comment_repo
        .insert(new_comment)
        .await
        .map_err(AppError::from)?;

    info!(comment_id = %comment.id, book_id = %id, "comment created");
    Ok((StatusCode::CREATED, Json(comment)).into_response())
}

#[tracing::instrument(skip(state))]
pub(crate) async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<BookId>,
) -> Result<Json<Vec<BookComment>>, ApiError> {
    // 404 for an unknown book rather than an empty list.
    state.book_repo.get(id).await.map_err(AppError::from)?;

    let comments = state
        .comment_repo
        .list_by_book(id)
        .await
        .map_err(AppError::from)?;

    Ok(Json(comments))
}
