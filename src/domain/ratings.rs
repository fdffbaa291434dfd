use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{BookId, RatingId, UserId};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// A single user's rating of a single book. At most one row exists per
/// `(user_id, book_id)` pair; re-rating overwrites value and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRating {
    pub id: RatingId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub value: i32,
    pub rated_at: DateTime<Utc>,
}

pub const fn is_valid_rating(value: i32) -> bool {
    value >= MIN_RATING && value <= MAX_RATING
}
