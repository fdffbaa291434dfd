use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::Value;

use crate::application::errors::{ApiError, AppError};
use crate::application::routes::support::{LimitQuery, ListQuery, paginated_response};
use crate::application::state::AppState;
use crate::domain::books::Book;
use crate::domain::ids::BookId;
use crate::domain::listing::{DEFAULT_LIMIT, PageRequest};

#[tracing::instrument(skip(state))]
pub(crate) async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let request = query.into_request();
    let page = state.catalog_service.list(request).await?;
    Ok(paginated_response(page.items, page.total, request))
}

#[tracing::instrument(skip(state))]
pub(crate) async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<BookId>,
) -> Result<Json<Book>, ApiError> {
    let book = state.catalog_service.get(id).await?;
    Ok(Json(book))
}

#[tracing::instrument(skip(state))]
pub(crate) async fn book_by_external_id(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let book = state.catalog_service.by_external_id(&external_id).await?;
    Ok(Json(book))
}

#[tracing::instrument(skip(state))]
pub(crate) async fn books_by_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let request = query.into_request();
    let page = state.catalog_service.by_category(&name, request).await?;
    Ok(paginated_response(page.items, page.total, request))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    offset: Option<u32>,
}

#[tracing::instrument(skip(state))]
pub(crate) async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let term = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .ok_or_else(|| AppError::validation("query parameter q is required"))?
        .to_string();

    let request = PageRequest::new(
        query.limit.unwrap_or(DEFAULT_LIMIT),
        query.offset.unwrap_or(0),
    );
    let page = state.catalog_service.search(&term, request).await?;
    Ok(paginated_response(page.items, page.total, request))
}

#[tracing::instrument(skip(state))]
pub(crate) async fn trending_books(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state.catalog_service.trending(query.limit()).await?;
    Ok(Json(books))
}

#[tracing::instrument(skip(state))]
pub(crate) async fn most_purchased_books(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state.catalog_service.most_purchased(query.limit()).await?;
    Ok(Json(books))
}
