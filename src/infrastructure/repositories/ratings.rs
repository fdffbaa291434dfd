use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::query_as;

use crate::domain::RepositoryError;
use crate::domain::books::Book;
use crate::domain::ids::{BookId, RatingId, UserId};
use crate::domain::ratings::UserRating;
use crate::domain::repositories::RatingRepository;
use crate::infrastructure::database::DatabasePool;

#[derive(Clone)]
pub struct SqlRatingRepository {
    pool: DatabasePool,
}

impl SqlRatingRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn into_rating(record: RatingRecord) -> UserRating {
        UserRating {
            id: RatingId::from(record.id),
            user_id: UserId::from(record.user_id),
            book_id: BookId::from(record.book_id),
            value: record.value,
            rated_at: record.rated_at,
        }
    }
}

#[async_trait]
impl RatingRepository for SqlRatingRepository {
    async fn rate(
        &self,
        user_id: UserId,
        book_id: BookId,
        value: i32,
    ) -> Result<(UserRating, Book), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        // Upsert: a second rating from the same user overwrites value and
        // timestamp, backed by the UNIQUE(user_id, book_id) constraint.
        let rating_record = query_as::<_, RatingRecord>(
            r"INSERT INTO user_ratings (user_id, book_id, value, rated_at)
              VALUES (?, ?, ?, ?)
              ON CONFLICT(user_id, book_id)
              DO UPDATE SET value = excluded.value, rated_at = excluded.rated_at
              RETURNING id, user_id, book_id, value, rated_at",
        )
        .bind(user_id.into_inner())
        .bind(book_id.into_inner())
        .bind(value)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if let sqlx::Error::Database(db_err) = &err
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::unexpected(err.to_string())
        })?;

        // Recompute the aggregate from the full rating set in the same
        // transaction. Never incremental running-average arithmetic: the
        // full recompute is the correctness baseline and also wipes any
        // provisional import-time values on the first real rating.
        let book_record = query_as::<_, AggregatedBookRecord>(
            r"UPDATE books
              SET rating = (SELECT ROUND(AVG(value), 1) FROM user_ratings WHERE book_id = ?),
                  rating_count = (SELECT COUNT(*) FROM user_ratings WHERE book_id = ?)
              WHERE id = ?
              RETURNING id, external_id, title, author, description, cover_url, genre,
                        is_free, rating, rating_count, publish_date, external_url, created_at",
        )
        .bind(book_id.into_inner())
        .bind(book_id.into_inner())
        .bind(book_id.into_inner())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| RepositoryError::unexpected(err.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit()
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok((Self::into_rating(rating_record), book_record.into_book()))
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<UserRating>, RepositoryError> {
        let records = query_as::<_, RatingRecord>(
            r"SELECT id, user_id, book_id, value, rated_at
              FROM user_ratings WHERE user_id = ? ORDER BY rated_at DESC, id DESC",
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(records.into_iter().map(Self::into_rating).collect())
    }
}

#[derive(sqlx::FromRow)]
struct RatingRecord {
    id: i64,
    user_id: i64,
    book_id: i64,
    value: i32,
    rated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AggregatedBookRecord {
    id: i64,
    external_id: Option<String>,
    title: String,
    author: String,
    description: Option<String>,
    cover_url: Option<String>,
    genre: Option<String>,
    is_free: bool,
    rating: f64,
    rating_count: i64,
    publish_date: Option<String>,
    external_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl AggregatedBookRecord {
    fn into_book(self) -> Book {
        Book {
            id: BookId::from(self.id),
            external_id: self.external_id,
            title: self.title,
            author: self.author,
            description: self.description,
            cover_url: self.cover_url,
            genre: self.genre,
            is_free: self.is_free,
            rating: self.rating,
            rating_count: self.rating_count,
            publish_date: self.publish_date,
            external_url: self.external_url,
            created_at: self.created_at,
        }
    }
}
