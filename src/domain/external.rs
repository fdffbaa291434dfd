use async_trait::async_trait;
use thiserror::Error;

use crate::domain::books::NewBook;

/// A validated, normalized candidate book from the external bibliographic
/// catalog. Carries provisional rating values computed at the adapter
/// boundary, since the external source supplies no user ratings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalBook {
    pub external_id: String,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub genre: Option<String>,
    pub is_free: bool,
    pub provisional_rating: f64,
    pub provisional_rating_count: i64,
    pub publish_date: Option<String>,
    pub external_url: Option<String>,
}

impl From<ExternalBook> for NewBook {
    fn from(candidate: ExternalBook) -> Self {
        NewBook {
            title: candidate.title,
            author: candidate.author,
            external_id: Some(candidate.external_id),
            description: candidate.description,
            cover_url: candidate.cover_url,
            genre: candidate.genre,
            is_free: candidate.is_free,
            rating: candidate.provisional_rating,
            rating_count: candidate.provisional_rating_count,
            publish_date: candidate.publish_date,
            external_url: candidate.external_url,
        }
    }
}

/// A failed or timed-out call to the external catalog. Recoverable: listing
/// paths degrade to local-only results instead of failing the request.
#[derive(Debug, Error)]
#[error("external catalog error: {0}")]
pub struct ExternalSourceError(pub String);

impl ExternalSourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The external bibliographic catalog, behind a trait so the merge layer can
/// be exercised against a test double.
#[async_trait]
pub trait ExternalCatalog: Send + Sync {
    async fn search(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ExternalBook>, ExternalSourceError>;

    async fn by_subject(
        &self,
        subject: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ExternalBook>, ExternalSourceError>;

    async fn trending(&self, limit: u32) -> Result<Vec<ExternalBook>, ExternalSourceError>;

    async fn work_by_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ExternalBook>, ExternalSourceError>;

    /// Best-effort longer-form description for an already-identified
    /// record. Implementations log and swallow failures; `None` never
    /// blocks an import.
    async fn description_for(&self, external_id: &str) -> Option<String>;
}
