use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{BookId, CommentId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookComment {
    pub id: CommentId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub user_id: UserId,
    pub book_id: BookId,
    pub text: String,
}

impl NewComment {
    pub fn normalize(mut self) -> Self {
        self.text = self.text.trim().to_string();
        self
    }
}
