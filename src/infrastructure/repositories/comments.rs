use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::query_as;

use crate::domain::RepositoryError;
use crate::domain::comments::{BookComment, NewComment};
use crate::domain::ids::{BookId, CommentId, UserId};
use crate::domain::repositories::CommentRepository;
use crate::infrastructure::database::DatabasePool;

#[derive(Clone)]
pub struct SqlCommentRepository {
    pool: DatabasePool,
}

impl SqlCommentRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn into_comment(record: CommentRecord) -> BookComment {
        BookComment {
            id: CommentId::from(record.id),
            user_id: UserId::from(record.user_id),
            book_id: BookId::from(record.book_id),
            text: record.text,
            created_at: record.created_at,
        }
    }
}

#[async_trait]
impl CommentRepository for SqlCommentRepository {
    async fn insert(&self, comment: NewComment) -> Result<BookComment, RepositoryError> {
        let record = query_as::<_, CommentRecord>(
            r"INSERT INTO book_comments (user_id, book_id, text, created_at)
              VALUES (?, ?, ?, ?)
              RETURNING id, user_id, book_id, text, created_at",
        )
        .bind(comment.user_id.into_inner())
        .bind(comment.book_id.into_inner())
        .bind(&comment.text)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if let sqlx::Error::Database(db_err) = &err
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::unexpected(err.to_string())
        })?;

        Ok(Self::into_comment(record))
    }

    async fn list_by_book(&self, book_id: BookId) -> Result<Vec<BookComment>, RepositoryError> {
        let records = query_as::<_, CommentRecord>(
            r"SELECT id, user_id, book_id, text, created_at
              FROM book_comments WHERE book_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(book_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(records.into_iter().map(Self::into_comment).collect())
    }

    async fn book_ids_for_user(
        &self,
        user_id: UserId,
    ) -> Result<HashSet<BookId>, RepositoryError> {
        let rows =
            query_as::<_, (i64,)>("SELECT DISTINCT book_id FROM book_comments WHERE user_id = ?")
                .bind(user_id.into_inner())
                .fetch_all(&self.pool)
                .await
                .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(rows.into_iter().map(|(id,)| BookId::from(id)).collect())
    }
}

#[derive(sqlx::FromRow)]
struct CommentRecord {
    id: i64,
    user_id: i64,
    book_id: i64,
    text: String,
    created_at: DateTime<Utc>,
}
