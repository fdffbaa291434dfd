pub(crate) mod books;
pub(crate) mod categories;
pub(crate) mod comments;
pub(crate) mod ratings;
pub(crate) mod recommendations;
pub(crate) mod saved_books;

use axum::routing::{get, post};

use crate::application::state::AppState;

pub(super) fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/books", get(books::list_books))
        .route("/books/search", get(books::search_books))
        .route("/books/trending", get(books::trending_books))
        .route("/books/most-purchased", get(books::most_purchased_books))
        .route("/books/category/{name}", get(books::books_by_category))
        .route("/books/external/{external_id}", get(books::book_by_external_id))
        .route("/books/{id}", get(books::get_book))
        .route("/books/{id}/rate", post(ratings::rate_book))
        .route(
            "/books/{id}/save",
            post(saved_books::save_book).delete(saved_books::unsave_book),
        )
        .route(
            "/books/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/saved-books", get(saved_books::list_saved_books))
        .route("/categories", get(categories::list_categories))
        .route(
            "/recommendations",
            get(recommendations::recommend_books),
        )
}
