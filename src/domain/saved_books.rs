use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{BookId, SavedBookId, UserId};

/// Join row recording that a user saved a book. A user may save a given
/// book at most once; duplicate saves are a conflict, not a second row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBook {
    pub id: SavedBookId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub saved_at: DateTime<Utc>,
}
