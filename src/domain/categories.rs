use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::CategoryId;

/// A browsable category. `book_count` is a display-only counter maintained
/// opportunistically; it is not an invariant of the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub book_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl NewCategory {
    pub fn normalize(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}
