use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::application::errors::AppError;
use crate::application::services::CatalogService;
use crate::domain::books::Book;
use crate::domain::ids::{BookId, UserId};
use crate::domain::repositories::{
    BookRepository, CommentRepository, RatingRepository, SavedBookRepository,
};

/// A rating at or above this value doubles the weight of the book's genre
/// and author in the preference tables.
const STRONG_RATING: i32 = 4;

/// How many genres and authors the preference profile keeps.
const PROFILE_WIDTH: usize = 3;

/// Preference-based recommendations. A pure function of the stored signals
/// (ratings, saves, comments), recomputed in full on every call.
#[derive(Clone)]
pub struct RecommendationService {
    books: Arc<dyn BookRepository>,
    ratings: Arc<dyn RatingRepository>,
    saved: Arc<dyn SavedBookRepository>,
    comments: Arc<dyn CommentRepository>,
    catalog: CatalogService,
}

impl RecommendationService {
    pub fn new(
        books: Arc<dyn BookRepository>,
        ratings: Arc<dyn RatingRepository>,
        saved: Arc<dyn SavedBookRepository>,
        comments: Arc<dyn CommentRepository>,
        catalog: CatalogService,
    ) -> Self {
        Self {
            books,
            ratings,
            saved,
            comments,
            catalog,
        }
    }

    pub async fn recommend(&self, user_id: UserId, limit: u32) -> Result<Vec<Book>, AppError> {
        let ratings = self.ratings.list_by_user(user_id).await?;
        let saved = self.saved.book_ids_for_user(user_id).await?;
        let commented = self.comments.book_ids_for_user(user_id).await?;

        let mut interacted: HashSet<BookId> = saved;
        interacted.extend(commented);
        interacted.extend(ratings.iter().map(|rating| rating.book_id));

        // No signals at all: serve what everyone else likes.
        if interacted.is_empty() {
            return self.catalog.trending(limit).await;
        }

        let rating_by_book: HashMap<BookId, i32> = ratings
            .iter()
            .map(|rating| (rating.book_id, rating.value))
            .collect();

        let interacted_books = self.books.get_many(&interacted).await?;

        let mut genres = FrequencyTable::new();
        let mut authors = FrequencyTable::new();
        for book in &interacted_books {
            let weight = if rating_by_book
                .get(&book.id)
                .is_some_and(|value| *value >= STRONG_RATING)
            {
                2
            } else {
                1
            };
            if let Some(genre) = book.genre.as_deref() {
                genres.bump(genre, weight);
            }
            authors.bump(&book.author, weight);
        }

        let top_genres = genres.top(PROFILE_WIDTH);
        let top_authors = authors.top(PROFILE_WIDTH);
        if top_genres.is_empty() && top_authors.is_empty() {
            return self.catalog.trending(limit).await;
        }

        let mut picks = self
            .books
            .list_by_genres_or_authors(&top_genres, &top_authors, &interacted, limit)
            .await?;

        // Top up a short result from trending, still skipping anything the
        // user has already interacted with.
        if picks.len() < limit as usize {
            let mut seen: HashSet<BookId> = picks.iter().map(|book| book.id).collect();
            for book in self.catalog.trending(limit * 2).await? {
                if picks.len() >= limit as usize {
                    break;
                }
                if !interacted.contains(&book.id) && seen.insert(book.id) {
                    picks.push(book);
                }
            }
        }

        Ok(picks)
    }
}

/// Insertion-ordered frequency table. Ties in `top` resolve to whichever key
/// was encountered first, which keeps the profile stable across calls.
struct FrequencyTable {
    entries: Vec<(String, u32)>,
}

impl FrequencyTable {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn bump(&mut self, key: &str, weight: u32) {
        let key = key.trim();
        if key.is_empty() {
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| name == key) {
            entry.1 += weight;
        } else {
            self.entries.push((key.to_string(), weight));
        }
    }

    fn top(mut self, count: usize) -> Vec<String> {
        // Stable sort keeps encounter order between equal weights.
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.entries
            .into_iter()
            .take(count)
            .map(|(name, _)| name)
            .collect()
    }
}
