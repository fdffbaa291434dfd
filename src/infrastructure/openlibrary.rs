use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::domain::external::{ExternalBook, ExternalCatalog, ExternalSourceError};

pub const OPENLIBRARY_URL: &str = "https://openlibrary.org";
const COVERS_URL: &str = "https://covers.openlibrary.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Query used to approximate a "bestseller" feed; the search endpoint has no
/// dedicated trending listing.
const TRENDING_QUERY: &str = "bestsellers";

const SEARCH_FIELDS: &str =
    "key,title,author_name,first_publish_year,edition_count,cover_i,subject,ebook_access";

/// Edition-count caps for the provisional popularity score. Search listings
/// report fewer editions than single-work fetches, so they saturate earlier.
const SEARCH_EDITION_CAP: f64 = 20.0;
const WORK_EDITION_CAP: f64 = 30.0;

const MAX_AGE_YEARS: f64 = 50.0;

/// Multiplier for deriving a provisional rating count from edition count.
const EDITION_COUNT_WEIGHT: f64 = 5.0;

/// Open Library client. All foreign JSON is validated into the serde models
/// below before anything crosses into the domain.
#[derive(Clone)]
pub struct OpenLibraryClient {
    client: reqwest::Client,
    base_url: Url,
}

impl OpenLibraryClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    /// GET a JSON resource. A 404 is a well-defined answer from this API
    /// (unknown work, author, or subject) and comes back as `Ok(None)`.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ExternalSourceError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| ExternalSourceError::new(err.to_string()))?;

        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|err| ExternalSourceError::new(err.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(ExternalSourceError::new(format!(
                "{path} returned {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|err| ExternalSourceError::new(err.to_string()))
    }

    async fn author_name(&self, author_key: &str) -> Option<String> {
        let key = last_path_segment(author_key)?;
        let path = format!("authors/{key}.json");
        match self.get_json::<AuthorResponse>(&path, &[]).await {
            Ok(author) => author.and_then(|a| a.name),
            Err(err) => {
                warn!(author_key, error = %err, "author name fetch failed");
                None
            }
        }
    }

    async fn search_docs(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ExternalBook>, ExternalSourceError> {
        let response: SearchResponse = self
            .get_json(
                "search.json",
                &[
                    ("q", query.to_string()),
                    ("limit", limit.to_string()),
                    ("offset", offset.to_string()),
                    ("fields", SEARCH_FIELDS.to_string()),
                ],
            )
            .await?
            .unwrap_or_default();

        let current_year = Utc::now().year();
        Ok(response
            .docs
            .into_iter()
            .filter_map(|doc| doc.into_candidate(current_year))
            .collect())
    }
}

#[async_trait]
impl ExternalCatalog for OpenLibraryClient {
    async fn search(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ExternalBook>, ExternalSourceError> {
        self.search_docs(query, limit, offset).await
    }

    async fn by_subject(
        &self,
        subject: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ExternalBook>, ExternalSourceError> {
        let slug = subject.trim().to_lowercase().replace(' ', "_");
        let path = format!("subjects/{slug}.json");
        // An unknown subject is an empty listing, not a failure.
        let response: SubjectResponse = self
            .get_json(
                &path,
                &[
                    ("limit", limit.to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await?
            .unwrap_or_default();

        let current_year = Utc::now().year();
        Ok(response
            .works
            .into_iter()
            .filter_map(|work| work.into_candidate(subject, current_year))
            .collect())
    }

    async fn trending(&self, limit: u32) -> Result<Vec<ExternalBook>, ExternalSourceError> {
        self.search_docs(TRENDING_QUERY, limit, 0).await
    }

    async fn work_by_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ExternalBook>, ExternalSourceError> {
        let path = format!("works/{external_id}.json");
        let Some(work) = self.get_json::<WorkResponse>(&path, &[]).await? else {
            return Ok(None);
        };

        let Some(title) = work.title.clone().filter(|t| !t.trim().is_empty()) else {
            return Ok(None);
        };

        let author = match work.first_author_key() {
            Some(key) => self
                .author_name(&key)
                .await
                .unwrap_or_else(|| "Unknown".to_string()),
            None => "Unknown".to_string(),
        };

        let current_year = Utc::now().year();
        Ok(Some(work.into_candidate(
            external_id,
            title,
            author,
            current_year,
        )))
    }

    async fn description_for(&self, external_id: &str) -> Option<String> {
        let path = format!("works/{external_id}.json");
        match self.get_json::<WorkResponse>(&path, &[]).await {
            Ok(work) => work.and_then(|w| w.description).map(WorkDescription::into_text),
            Err(err) => {
                warn!(external_id, error = %err, "work description fetch failed");
                None
            }
        }
    }
}

// --- Provisional popularity scoring ---
//
// The external source carries no user ratings, so newly-imported books get a
// heuristic rating in [3.0, 5.0]: newer books and books with many editions
// score higher. Real ratings supersede these values on the first rate() call.

fn age_factor(first_publish_year: Option<i32>, current_year: i32) -> f64 {
    // Unknown age reads as old: no recency boost.
    let Some(year) = first_publish_year else {
        return 1.0;
    };
    let age = f64::from((current_year - year).max(0));
    (age.min(MAX_AGE_YEARS)) / MAX_AGE_YEARS
}

fn edition_factor(edition_count: i64, cap: f64) -> f64 {
    let editions = edition_count.max(0) as f64;
    editions.min(cap) / cap
}

fn provisional_rating(
    first_publish_year: Option<i32>,
    edition_count: i64,
    cap: f64,
    current_year: i32,
) -> f64 {
    let age = age_factor(first_publish_year, current_year);
    let editions = edition_factor(edition_count, cap);
    let raw = 3.0 + (1.0 - age) * 1.5 + editions * 0.5;
    (raw * 10.0).round() / 10.0
}

fn provisional_rating_count(
    first_publish_year: Option<i32>,
    edition_count: i64,
    current_year: i32,
) -> i64 {
    let age = age_factor(first_publish_year, current_year);
    (edition_count.max(0) as f64)
        .mul_add(EDITION_COUNT_WEIGHT, (1.0 - age) * 100.0)
        .round() as i64
}

/// Stable key of a foreign record: the last path segment of its key field
/// (e.g. `/works/OL45883W` -> `OL45883W`).
fn last_path_segment(key: &str) -> Option<String> {
    let segment = key.rsplit('/').next()?.trim();
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

fn cover_url_from_id(cover_id: i64) -> String {
    format!("{COVERS_URL}/b/id/{cover_id}-M.jpg")
}

fn work_url(external_id: &str) -> String {
    format!("{OPENLIBRARY_URL}/works/{external_id}")
}

fn is_free_access(ebook_access: Option<&str>) -> bool {
    matches!(ebook_access, Some("public" | "borrowable"))
}

// --- Response models (the validated boundary for foreign JSON) ---

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchDoc {
    key: Option<String>,
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    first_publish_year: Option<i32>,
    #[serde(default)]
    edition_count: i64,
    cover_i: Option<i64>,
    #[serde(default)]
    subject: Vec<String>,
    ebook_access: Option<String>,
}

impl SearchDoc {
    /// Normalize a search doc into a candidate; records missing a stable
    /// identifier or a title are skipped.
    fn into_candidate(self, current_year: i32) -> Option<ExternalBook> {
        let external_id = self.key.as_deref().and_then(last_path_segment)?;
        let title = self.title.filter(|t| !t.trim().is_empty())?;

        Some(ExternalBook {
            external_url: Some(work_url(&external_id)),
            title,
            author: self
                .author_name
                .into_iter()
                .next()
                .unwrap_or_else(|| "Unknown".to_string()),
            description: None,
            cover_url: self.cover_i.map(cover_url_from_id),
            genre: self.subject.into_iter().find(|s| !s.trim().is_empty()),
            is_free: is_free_access(self.ebook_access.as_deref()),
            provisional_rating: provisional_rating(
                self.first_publish_year,
                self.edition_count,
                SEARCH_EDITION_CAP,
                current_year,
            ),
            provisional_rating_count: provisional_rating_count(
                self.first_publish_year,
                self.edition_count,
                current_year,
            ),
            publish_date: self.first_publish_year.map(|y| y.to_string()),
            external_id,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct SubjectResponse {
    #[serde(default)]
    works: Vec<SubjectWork>,
}

#[derive(Debug, Default, Deserialize)]
struct SubjectWork {
    key: Option<String>,
    title: Option<String>,
    #[serde(default)]
    authors: Vec<SubjectAuthor>,
    cover_id: Option<i64>,
    first_publish_year: Option<i32>,
    #[serde(default)]
    edition_count: i64,
    availability: Option<Availability>,
}

#[derive(Debug, Deserialize)]
struct SubjectAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Availability {
    status: Option<String>,
}

impl SubjectWork {
    fn into_candidate(self, subject: &str, current_year: i32) -> Option<ExternalBook> {
        let external_id = self.key.as_deref().and_then(last_path_segment)?;
        let title = self.title.filter(|t| !t.trim().is_empty())?;

        let is_free = matches!(
            self.availability
                .as_ref()
                .and_then(|a| a.status.as_deref()),
            Some("open" | "borrow_available")
        );

        Some(ExternalBook {
            external_url: Some(work_url(&external_id)),
            title,
            author: self
                .authors
                .into_iter()
                .find_map(|a| a.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            description: None,
            cover_url: self.cover_id.map(cover_url_from_id),
            genre: Some(subject.to_string()),
            is_free,
            provisional_rating: provisional_rating(
                self.first_publish_year,
                self.edition_count,
                SEARCH_EDITION_CAP,
                current_year,
            ),
            provisional_rating_count: provisional_rating_count(
                self.first_publish_year,
                self.edition_count,
                current_year,
            ),
            publish_date: self.first_publish_year.map(|y| y.to_string()),
            external_id,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct WorkResponse {
    title: Option<String>,
    description: Option<WorkDescription>,
    #[serde(default)]
    covers: Vec<i64>,
    #[serde(default)]
    subjects: Vec<String>,
    revision: Option<i64>,
    #[serde(default)]
    authors: Vec<WorkAuthorEntry>,
    first_publish_date: Option<String>,
}

impl WorkResponse {
    fn first_author_key(&self) -> Option<String> {
        self.authors
            .iter()
            .find_map(|entry| entry.author.as_ref().map(|a| a.key.clone()))
    }

    fn into_candidate(
        self,
        external_id: &str,
        title: String,
        author: String,
        current_year: i32,
    ) -> ExternalBook {
        let first_publish_year = self
            .first_publish_date
            .as_deref()
            .and_then(parse_publish_year);
        let revisions = self.revision.unwrap_or(0);

        ExternalBook {
            external_id: external_id.to_string(),
            external_url: Some(work_url(external_id)),
            title,
            author,
            description: self.description.map(WorkDescription::into_text),
            cover_url: self
                .covers
                .into_iter()
                .find(|&id| id > 0)
                .map(cover_url_from_id),
            genre: self.subjects.into_iter().find(|s| !s.trim().is_empty()),
            is_free: false,
            provisional_rating: provisional_rating(
                first_publish_year,
                revisions,
                WORK_EDITION_CAP,
                current_year,
            ),
            provisional_rating_count: provisional_rating_count(
                first_publish_year,
                revisions,
                current_year,
            ),
            publish_date: self.first_publish_date,
        }
    }
}

/// Work descriptions arrive either as a bare string or as
/// `{"type": "/type/text", "value": "..."}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkDescription {
    Text(String),
    Typed { value: String },
}

impl WorkDescription {
    fn into_text(self) -> String {
        match self {
            WorkDescription::Text(value) | WorkDescription::Typed { value } => value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorkAuthorEntry {
    author: Option<AuthorKeyRef>,
}

#[derive(Debug, Deserialize)]
struct AuthorKeyRef {
    key: String,
}

#[derive(Debug, Deserialize)]
struct AuthorResponse {
    name: Option<String>,
}

/// Pull a year out of dates like "1965", "May 1965", or "1965-05-01".
fn parse_publish_year(date: &str) -> Option<i32> {
    date.split(|c: char| !c.is_ascii_digit())
        .filter(|part| part.len() == 4)
        .find_map(|part| part.parse().ok())
}
