use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::BookId;

/// A catalog book. Locally seeded rows have no `external_id`; rows imported
/// from the external catalog carry the stable key of their source record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub external_id: Option<String>,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub genre: Option<String>,
    pub is_free: bool,
    /// Arithmetic mean of all user ratings, rounded to one decimal place.
    /// Holds a provisional heuristic value for imported books until the
    /// first real rating arrives.
    pub rating: f64,
    pub rating_count: i64,
    pub publish_date: Option<String>,
    pub external_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub rating_count: i64,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
}

impl NewBook {
    pub fn normalize(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.author = self.author.trim().to_string();
        self.external_id = normalize_optional_field(self.external_id);
        self.description = normalize_optional_field(self.description);
        self.cover_url = normalize_optional_field(self.cover_url);
        self.genre = normalize_optional_field(self.genre);
        self.publish_date = normalize_optional_field(self.publish_date);
        self.external_url = normalize_optional_field(self.external_url);
        self.rating = self.rating.clamp(0.0, 5.0);
        self.rating_count = self.rating_count.max(0);
        self
    }
}

fn normalize_optional_field(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
