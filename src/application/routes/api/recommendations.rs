use axum::Json;
use axum::extract::{Query, State};

use crate::application::auth::AuthenticatedUser;
use crate::application::errors::ApiError;
use crate::application::routes::support::LimitQuery;
use crate::application::state::AppState;
use crate::domain::books::Book;

#[tracing::instrument(skip(state, auth_user))]
pub(crate) async fn recommend_books(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state
        .recommendation_service
        .recommend(auth_user.0.id, query.limit())
        .await?;

    Ok(Json(books))
}
