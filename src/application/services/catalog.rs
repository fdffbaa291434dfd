use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::application::errors::AppError;
use crate::domain::RepositoryError;
use crate::domain::books::{Book, NewBook};
use crate::domain::external::{ExternalBook, ExternalCatalog};
use crate::domain::ids::BookId;
use crate::domain::listing::{BookPage, CountEstimate, PageRequest};
use crate::domain::repositories::BookRepository;

/// Stand-in total when external results fill out a page. The external source
/// exposes no cheap exact count, so pagination reports this heuristic upper
/// bound (flagged approximate) rather than a number we cannot know.
pub const EXTERNAL_TOTAL_ESTIMATE: u64 = 1000;

/// Local-first catalog with external fill. Listing paths query the local
/// store, then top up short pages from the external catalog, importing
/// candidates as they go. External failures degrade to local-only results.
#[derive(Clone)]
pub struct CatalogService {
    books: Arc<dyn BookRepository>,
    catalog: Arc<dyn ExternalCatalog>,
}

impl CatalogService {
    pub fn new(books: Arc<dyn BookRepository>, catalog: Arc<dyn ExternalCatalog>) -> Self {
        Self { books, catalog }
    }

    pub async fn get(&self, id: BookId) -> Result<Book, AppError> {
        self.books.get(id).await.map_err(AppError::from)
    }

    /// Look a book up by its external catalog id, importing it on first
    /// encounter. Unlike the listing paths there is no local result to
    /// degrade to, so adapter failures surface as errors.
    pub async fn by_external_id(&self, external_id: &str) -> Result<Book, AppError> {
        match self.books.get_by_external_id(external_id).await {
            Ok(existing) => return Ok(existing),
            Err(RepositoryError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let candidate = self
            .catalog
            .work_by_id(external_id)
            .await
            .map_err(|err| AppError::unexpected(err.to_string()))?
            .ok_or_else(|| AppError::not_found("book not found"))?;

        self.books
            .find_or_create_external(NewBook::from(candidate).normalize())
            .await
            .map_err(AppError::from)
    }

    /// Plain listing is local-only: no query to forward, nothing sensible to
    /// fill from outside.
    pub async fn list(&self, request: PageRequest) -> Result<BookPage<Book>, AppError> {
        let (items, total) = self.books.list(request).await?;
        Ok(BookPage {
            items,
            total: CountEstimate::exact(total),
        })
    }

    pub async fn by_category(
        &self,
        name: &str,
        request: PageRequest,
    ) -> Result<BookPage<Book>, AppError> {
        let (items, local_total) = self.books.list_by_genre(name, request).await?;
        if items.len() >= request.limit() as usize {
            return Ok(BookPage {
                items,
                total: CountEstimate::exact(local_total),
            });
        }

        let remainder = request.remainder_after(items.len());
        let fetched = self
            .catalog
            .by_subject(name, remainder.limit(), remainder.offset())
            .await;

        self.fill_page(items, local_total, fetched, request).await
    }

    pub async fn search(
        &self,
        query: &str,
        request: PageRequest,
    ) -> Result<BookPage<Book>, AppError> {
        let (items, local_total) = self.books.search(query, request).await?;
        if items.len() >= request.limit() as usize {
            return Ok(BookPage {
                items,
                total: CountEstimate::exact(local_total),
            });
        }

        let remainder = request.remainder_after(items.len());
        let fetched = self
            .catalog
            .search(query, remainder.limit(), remainder.offset())
            .await;

        self.fill_page(items, local_total, fetched, request).await
    }

    /// Best-rated books. Falls back to the external trending query only when
    /// the local store carries no real rating signal.
    pub async fn trending(&self, limit: u32) -> Result<Vec<Book>, AppError> {
        let local = self.books.top_rated(limit).await?;
        if has_rating_signal(&local) {
            return Ok(local);
        }
        self.external_trending(local, limit).await
    }

    /// Most-rated books, same fallback rule as [`Self::trending`].
    pub async fn most_purchased(&self, limit: u32) -> Result<Vec<Book>, AppError> {
        let local = self.books.most_rated(limit).await?;
        if has_rating_signal(&local) {
            return Ok(local);
        }
        self.external_trending(local, limit).await
    }

    async fn external_trending(
        &self,
        local: Vec<Book>,
        limit: u32,
    ) -> Result<Vec<Book>, AppError> {
        let candidates = match self.catalog.trending(limit).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(error = %err, "external trending unavailable, serving local results");
                return Ok(local);
            }
        };

        let mut seen: HashSet<BookId> = local.iter().map(|book| book.id).collect();
        let mut books = local;
        for candidate in candidates {
            if books.len() >= limit as usize {
                break;
            }
            match self.import(candidate).await {
                Ok(book) if seen.insert(book.id) => books.push(book),
                Ok(_) => {}
                Err(err) => warn!(error = %err, "failed to import trending candidate"),
            }
        }
        Ok(books)
    }

    /// Append imported external candidates to a short local page. Existing
    /// rows are matched by external id and never overwritten, so local
    /// ratings survive re-imports.
    async fn fill_page(
        &self,
        local: Vec<Book>,
        local_total: u64,
        fetched: Result<Vec<ExternalBook>, crate::domain::external::ExternalSourceError>,
        request: PageRequest,
    ) -> Result<BookPage<Book>, AppError> {
        let candidates = match fetched {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(error = %err, "external catalog unavailable, serving local results");
                return Ok(BookPage {
                    items: local,
                    total: CountEstimate::exact(local_total),
                });
            }
        };

        let mut seen: HashSet<BookId> = local.iter().map(|book| book.id).collect();
        let mut items = local;
        for candidate in candidates {
            if items.len() >= request.limit() as usize {
                break;
            }
            match self.import(candidate).await {
                Ok(book) if seen.insert(book.id) => items.push(book),
                Ok(_) => {}
                Err(err) => warn!(error = %err, "failed to import external candidate"),
            }
        }

        Ok(BookPage {
            items,
            total: CountEstimate::approximate(local_total.max(EXTERNAL_TOTAL_ESTIMATE)),
        })
    }

    /// Import one external candidate, deduplicating on external id. The
    /// existing-row check keeps the common re-encounter path cheap (no
    /// description fetch); the insert itself is race-safe either way.
    async fn import(&self, candidate: ExternalBook) -> Result<Book, AppError> {
        match self.books.get_by_external_id(&candidate.external_id).await {
            Ok(existing) => return Ok(existing),
            Err(RepositoryError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let mut new_book = NewBook::from(candidate);
        if new_book.description.is_none()
            && let Some(external_id) = new_book.external_id.as_deref()
        {
            new_book.description = self.catalog.description_for(external_id).await;
        }

        self.books
            .find_or_create_external(new_book.normalize())
            .await
            .map_err(AppError::from)
    }
}

fn has_rating_signal(books: &[Book]) -> bool {
    books.first().is_some_and(|book| book.rating > 0.0)
}
