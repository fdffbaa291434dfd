use axum::Json;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::books::Book;
use crate::domain::listing::{CountEstimate, DEFAULT_LIMIT, MAX_LIMIT, PageRequest};

/// Query parameters shared by the paginated listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    offset: Option<u32>,
}

impl ListQuery {
    pub fn into_request(self) -> PageRequest {
        PageRequest::new(
            self.limit.unwrap_or(DEFAULT_LIMIT),
            self.offset.unwrap_or(0),
        )
    }
}

/// Query parameter for the flat (non-paginated) listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct LimitQuery {
    #[serde(default)]
    limit: Option<u32>,
}

impl LimitQuery {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Build the `{books, pagination}` envelope the listing endpoints share.
/// `approximate` is surfaced so clients know when the total is the external
/// heuristic rather than an exact count.
pub(crate) fn paginated_response(
    books: Vec<Book>,
    total: CountEstimate,
    request: PageRequest,
) -> Json<Value> {
    let limit = u64::from(request.limit());
    let offset = u64::from(request.offset());
    let has_next_page = offset + limit < total.total;
    let has_prev_page = offset > 0;

    Json(json!({
        "books": books,
        "pagination": {
            "totalBooks": total.total,
            "totalPages": total.total_pages(request.limit()),
            "currentPage": offset / limit + 1,
            "limit": request.limit(),
            "offset": request.offset(),
            "hasNextPage": has_next_page,
            "hasPrevPage": has_prev_page,
            "nextPageOffset": has_next_page.then(|| offset + limit),
            "prevPageOffset": has_prev_page.then(|| offset.saturating_sub(limit)),
            "approximate": total.approximate,
        },
    }))
}
