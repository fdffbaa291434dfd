use std::sync::Arc;

use crate::application::errors::AppError;
use crate::domain::books::Book;
use crate::domain::ids::{BookId, UserId};
use crate::domain::ratings::{MAX_RATING, MIN_RATING, UserRating, is_valid_rating};
use crate::domain::repositories::RatingRepository;

#[derive(Clone)]
pub struct RatingService {
    ratings: Arc<dyn RatingRepository>,
}

impl RatingService {
    pub fn new(ratings: Arc<dyn RatingRepository>) -> Self {
        Self { ratings }
    }

    /// Record or overwrite the user's rating for a book and return the
    /// updated rating plus the re-aggregated book. Out-of-range values are
    /// rejected before anything touches the store.
    pub async fn rate(
        &self,
        user_id: UserId,
        book_id: BookId,
        value: i32,
    ) -> Result<(UserRating, Book), AppError> {
        if !is_valid_rating(value) {
            return Err(AppError::validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }

        self.ratings
            .rate(user_id, book_id, value)
            .await
            .map_err(AppError::from)
    }
}
