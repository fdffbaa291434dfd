use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::application::auth::AuthenticatedUser;
use crate::application::errors::ApiError;
use crate::application::state::AppState;
use crate::domain::ids::BookId;

#[derive(Debug, Deserialize)]
pub(crate) struct RatingSubmission {
    rating: i32,
}

#[tracing::instrument(skip(state, auth_user))]
pub(crate) async fn rate_book(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<BookId>,
    Json(submission): Json<RatingSubmission>,
) -> Result<Json<Value>, ApiError> {
    let user_id = auth_user.0.id;
    let (rating, book) = state
        .rating_service
        .rate(user_id, id, submission.rating)
        .await?;

    info!(
        book_id = %id,
        value = rating.value,
        aggregate = book.rating,
        count = book.rating_count,
        "book rated"
    );

    Ok(Json(json!({ "rating": rating, "book": book })))
}
