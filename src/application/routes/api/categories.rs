use axum::Json;
use axum::extract::State;

use crate::application::errors::{ApiError, AppError};
use crate::application::state::AppState;
use crate::domain::categories::Category;

#[tracing::instrument(skip(state))]
pub(crate) async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = state
        .category_repo
        .list_all()
        .await
        .map_err(AppError::from)?;

    Ok(Json(categories))
}
