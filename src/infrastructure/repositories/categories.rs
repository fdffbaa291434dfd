use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::query_as;

use crate::domain::RepositoryError;
use crate::domain::categories::{Category, NewCategory};
use crate::domain::ids::CategoryId;
use crate::domain::repositories::CategoryRepository;
use crate::infrastructure::database::DatabasePool;

#[derive(Clone)]
pub struct SqlCategoryRepository {
    pool: DatabasePool,
}

impl SqlCategoryRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn into_category(record: CategoryRecord) -> Category {
        Category {
            id: CategoryId::from(record.id),
            name: record.name,
            icon: record.icon,
            color: record.color,
            book_count: record.book_count,
            created_at: record.created_at,
        }
    }
}

#[async_trait]
impl CategoryRepository for SqlCategoryRepository {
    async fn insert(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        let record = query_as::<_, CategoryRecord>(
            r"INSERT INTO categories (name, icon, color, created_at)
              VALUES (?, ?, ?, ?)
              RETURNING id, name, icon, color, book_count, created_at",
        )
        .bind(&category.name)
        .bind(category.icon.as_deref())
        .bind(category.color.as_deref())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if let sqlx::Error::Database(db_err) = &err
                && db_err.is_unique_violation()
            {
                return RepositoryError::conflict("A category with this name already exists");
            }
            RepositoryError::unexpected(err.to_string())
        })?;

        Ok(Self::into_category(record))
    }

    async fn list_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let records = query_as::<_, CategoryRecord>(
            r"SELECT id, name, icon, color, book_count, created_at
              FROM categories ORDER BY LOWER(name)",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(records.into_iter().map(Self::into_category).collect())
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRecord {
    id: i64,
    name: String,
    icon: Option<String>,
    color: Option<String>,
    book_count: i64,
    created_at: DateTime<Utc>,
}
