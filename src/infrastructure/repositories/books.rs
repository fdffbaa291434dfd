use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, query_as, query_scalar};

use crate::domain::RepositoryError;
use crate::domain::books::{Book, NewBook};
use crate::domain::ids::BookId;
use crate::domain::listing::PageRequest;
use crate::domain::repositories::BookRepository;
use crate::infrastructure::database::{DatabaseDriver, DatabasePool};

const BOOK_COLUMNS: &str = "id, external_id, title, author, description, cover_url, genre, \
                            is_free, rating, rating_count, publish_date, external_url, created_at";

#[derive(Clone)]
pub struct SqlBookRepository {
    pool: DatabasePool,
}

impl SqlBookRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn into_book(record: BookRecord) -> Book {
        Book {
            id: BookId::from(record.id),
            external_id: record.external_id,
            title: record.title,
            author: record.author,
            description: record.description,
            cover_url: record.cover_url,
            genre: record.genre,
            is_free: record.is_free,
            rating: record.rating,
            rating_count: record.rating_count,
            publish_date: record.publish_date,
            external_url: record.external_url,
            created_at: record.created_at,
        }
    }

    fn push_insert_values(builder: &mut QueryBuilder<'_, DatabaseDriver>, book: &NewBook) {
        let mut values = builder.separated(", ");
        values.push_bind(book.external_id.clone());
        values.push_bind(book.title.clone());
        values.push_bind(book.author.clone());
        values.push_bind(book.description.clone());
        values.push_bind(book.cover_url.clone());
        values.push_bind(book.genre.clone());
        values.push_bind(book.is_free);
        values.push_bind(book.rating);
        values.push_bind(book.rating_count);
        values.push_bind(book.publish_date.clone());
        values.push_bind(book.external_url.clone());
        values.push_bind(Utc::now());
    }
}

/// Escape LIKE wildcards in a user-supplied search term and wrap it for a
/// substring match.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

const SEARCH_CONDITION: &str = "(title LIKE ? ESCAPE '\\' \
     OR author LIKE ? ESCAPE '\\' \
     OR COALESCE(description, '') LIKE ? ESCAPE '\\' \
     OR COALESCE(genre, '') LIKE ? ESCAPE '\\')";

#[async_trait]
impl BookRepository for SqlBookRepository {
    async fn insert(&self, book: NewBook) -> Result<Book, RepositoryError> {
        let sql = format!(
            "INSERT INTO books (external_id, title, author, description, cover_url, genre, \
             is_free, rating, rating_count, publish_date, external_url, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {BOOK_COLUMNS}"
        );

        let record = query_as::<_, BookRecord>(&sql)
            .bind(book.external_id.as_deref())
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.description.as_deref())
            .bind(book.cover_url.as_deref())
            .bind(book.genre.as_deref())
            .bind(book.is_free)
            .bind(book.rating)
            .bind(book.rating_count)
            .bind(book.publish_date.as_deref())
            .bind(book.external_url.as_deref())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if let sqlx::Error::Database(db_err) = &err
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::conflict(
                        "A book with this external id already exists",
                    );
                }
                RepositoryError::unexpected(err.to_string())
            })?;

        Ok(Self::into_book(record))
    }

    async fn get(&self, id: BookId) -> Result<Book, RepositoryError> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?");

        let record = query_as::<_, BookRecord>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        Ok(Self::into_book(record))
    }

    async fn get_by_external_id(&self, external_id: &str) -> Result<Book, RepositoryError> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE external_id = ?");

        let record = query_as::<_, BookRecord>(&sql)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        Ok(Self::into_book(record))
    }

    async fn find_or_create_external(&self, book: NewBook) -> Result<Book, RepositoryError> {
        let Some(external_id) = book.external_id.clone() else {
            return Err(RepositoryError::unexpected(
                "externally-sourced book without an external id",
            ));
        };

        // Insert-if-absent and re-read inside one transaction; the UNIQUE
        // constraint on external_id resolves the check-then-act race (a
        // concurrent insert simply makes ours a no-op and the re-read
        // returns the winner's row, local ratings intact).
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        let mut builder = QueryBuilder::<DatabaseDriver>::new(
            "INSERT INTO books (external_id, title, author, description, cover_url, genre, \
             is_free, rating, rating_count, publish_date, external_url, created_at) VALUES (",
        );
        Self::push_insert_values(&mut builder, &book);
        builder.push(") ON CONFLICT(external_id) DO NOTHING");

        builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE external_id = ?");
        let record = query_as::<_, BookRecord>(&sql)
            .bind(&external_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        tx.commit()
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(Self::into_book(record))
    }

    async fn list(&self, request: PageRequest) -> Result<(Vec<Book>, u64), RepositoryError> {
        let total: i64 = query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let records = query_as::<_, BookRecord>(&sql)
            .bind(i64::from(request.limit()))
            .bind(i64::from(request.offset()))
            .fetch_all(&self.pool)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok((
            records.into_iter().map(Self::into_book).collect(),
            total as u64,
        ))
    }

    async fn list_by_genre(
        &self,
        genre: &str,
        request: PageRequest,
    ) -> Result<(Vec<Book>, u64), RepositoryError> {
        let total: i64 =
            query_scalar("SELECT COUNT(*) FROM books WHERE LOWER(genre) = LOWER(?)")
                .bind(genre)
                .fetch_one(&self.pool)
                .await
                .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE LOWER(genre) = LOWER(?) \
             ORDER BY rating DESC, rating_count DESC, id LIMIT ? OFFSET ?"
        );
        let records = query_as::<_, BookRecord>(&sql)
            .bind(genre)
            .bind(i64::from(request.limit()))
            .bind(i64::from(request.offset()))
            .fetch_all(&self.pool)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok((
            records.into_iter().map(Self::into_book).collect(),
            total as u64,
        ))
    }

    async fn search(
        &self,
        query: &str,
        request: PageRequest,
    ) -> Result<(Vec<Book>, u64), RepositoryError> {
        let pattern = like_pattern(query);

        let count_sql = format!("SELECT COUNT(*) FROM books WHERE {SEARCH_CONDITION}");
        let total: i64 = query_scalar(&count_sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE {SEARCH_CONDITION} \
             ORDER BY rating DESC, rating_count DESC, id LIMIT ? OFFSET ?"
        );
        let records = query_as::<_, BookRecord>(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(i64::from(request.limit()))
            .bind(i64::from(request.offset()))
            .fetch_all(&self.pool)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok((
            records.into_iter().map(Self::into_book).collect(),
            total as u64,
        ))
    }

    async fn top_rated(&self, limit: u32) -> Result<Vec<Book>, RepositoryError> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY rating DESC, rating_count DESC, id LIMIT ?"
        );
        let records = query_as::<_, BookRecord>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(records.into_iter().map(Self::into_book).collect())
    }

    async fn most_rated(&self, limit: u32) -> Result<Vec<Book>, RepositoryError> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY rating_count DESC, rating DESC, id LIMIT ?"
        );
        let records = query_as::<_, BookRecord>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(records.into_iter().map(Self::into_book).collect())
    }

    async fn get_many(&self, ids: &HashSet<BookId>) -> Result<Vec<Book>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<DatabaseDriver>::new(format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id IN ("
        ));
        let mut sep = builder.separated(", ");
        for id in ids {
            sep.push_bind(id.into_inner());
        }
        sep.push_unseparated(")");

        let records = builder
            .build_query_as::<BookRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(records.into_iter().map(Self::into_book).collect())
    }

    async fn list_by_genres_or_authors(
        &self,
        genres: &[String],
        authors: &[String],
        exclude: &HashSet<BookId>,
        limit: u32,
    ) -> Result<Vec<Book>, RepositoryError> {
        if genres.is_empty() && authors.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<DatabaseDriver>::new(format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE ("
        ));

        let mut first = true;
        if !genres.is_empty() {
            builder.push("LOWER(genre) IN (");
            let mut sep = builder.separated(", ");
            for genre in genres {
                sep.push_bind(genre.to_lowercase());
            }
            sep.push_unseparated(")");
            first = false;
        }
        if !authors.is_empty() {
            if !first {
                builder.push(" OR ");
            }
            builder.push("LOWER(author) IN (");
            let mut sep = builder.separated(", ");
            for author in authors {
                sep.push_bind(author.to_lowercase());
            }
            sep.push_unseparated(")");
        }
        builder.push(")");

        if !exclude.is_empty() {
            builder.push(" AND id NOT IN (");
            let mut sep = builder.separated(", ");
            for id in exclude {
                sep.push_bind(id.into_inner());
            }
            sep.push_unseparated(")");
        }

        builder.push(" ORDER BY rating DESC, rating_count DESC, id LIMIT ");
        builder.push_bind(i64::from(limit));

        let records = builder
            .build_query_as::<BookRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(records.into_iter().map(Self::into_book).collect())
    }
}

#[derive(sqlx::FromRow)]
struct BookRecord {
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
