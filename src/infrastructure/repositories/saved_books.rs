use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as};

use crate::domain::RepositoryError;
use crate::domain::books::Book;
use crate::domain::ids::{BookId, SavedBookId, UserId};
use crate::domain::repositories::SavedBookRepository;
use crate::domain::saved_books::SavedBook;
use crate::infrastructure::database::DatabasePool;

#[derive(Clone)]
pub struct SqlSavedBookRepository {
    pool: DatabasePool,
}

impl SqlSavedBookRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn into_saved_book(record: SavedBookRecord) -> SavedBook {
        SavedBook {
            id: SavedBookId::from(record.id),
            user_id: UserId::from(record.user_id),
            book_id: BookId::from(record.book_id),
            saved_at: record.saved_at,
        }
    }
}

#[async_trait]
impl SavedBookRepository for SqlSavedBookRepository {
    async fn insert(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<SavedBook, RepositoryError> {
        let record = query_as::<_, SavedBookRecord>(
            r"INSERT INTO saved_books (user_id, book_id, saved_at)
              VALUES (?, ?, ?)
              RETURNING id, user_id, book_id, saved_at",
        )
        .bind(user_id.into_inner())
        .bind(book_id.into_inner())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if let sqlx::Error::Database(db_err) = &err {
                if db_err.is_unique_violation() {
                    return RepositoryError::conflict("This book is already saved");
                }
                if db_err.is_foreign_key_violation() {
                    return RepositoryError::NotFound;
                }
            }
            RepositoryError::unexpected(err.to_string())
        })?;

        Ok(Self::into_saved_book(record))
    }

    async fn delete(&self, user_id: UserId, book_id: BookId) -> Result<(), RepositoryError> {
        let result = query("DELETE FROM saved_books WHERE user_id = ? AND book_id = ?")
            .bind(user_id.into_inner())
            .bind(book_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn book_ids_for_user(
        &self,
        user_id: UserId,
    ) -> Result<HashSet<BookId>, RepositoryError> {
        let rows = query_as::<_, (i64,)>("SELECT book_id FROM saved_books WHERE user_id = ?")
            .bind(user_id.into_inner())
            .fetch_all(&self.pool)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(rows.into_iter().map(|(id,)| BookId::from(id)).collect())
    }

    async fn books_for_user(&self, user_id: UserId) -> Result<Vec<Book>, RepositoryError> {
        let records = query_as::<_, SavedBookJoinRecord>(
            r"SELECT b.id, b.external_id, b.title, b.author, b.description, b.cover_url,
                     b.genre, b.is_free, b.rating, b.rating_count, b.publish_date,
                     b.external_url, b.created_at
              FROM saved_books sb
              JOIN books b ON b.id = sb.book_id
              WHERE sb.user_id = ?
              ORDER BY sb.saved_at DESC, sb.id DESC",
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(records.into_iter().map(SavedBookJoinRecord::into_book).collect())
    }
}

#[derive(sqlx::FromRow)]
struct SavedBookRecord {
    id: i64,
    user_id: i64,
    book_id: i64,
    saved_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SavedBookJoinRecord {
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

impl SavedBookJoinRecord {
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
