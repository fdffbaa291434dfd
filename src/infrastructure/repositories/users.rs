use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::query_as;

use crate::domain::RepositoryError;
use crate::domain::ids::{TokenId, UserId};
use crate::domain::repositories::{TokenRepository, UserRepository};
use crate::domain::users::{NewToken, NewUser, Token, User};
use crate::infrastructure::database::DatabasePool;

#[derive(Clone)]
pub struct SqlUserRepository {
    pool: DatabasePool,
}

impl SqlUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn into_user(record: UserRecord) -> User {
        User {
            id: UserId::from(record.id),
            username: record.username,
            uuid: record.uuid,
            created_at: record.created_at,
        }
    }
}

#[async_trait]
impl UserRepository for SqlUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let record = query_as::<_, UserRecord>(
            r"INSERT INTO users (username, uuid, created_at)
              VALUES (?, ?, ?)
              RETURNING id, username, uuid, created_at",
        )
        .bind(&user.username)
        .bind(&user.uuid)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if let sqlx::Error::Database(db_err) = &err
                && db_err.is_unique_violation()
            {
                return RepositoryError::conflict("A user with this username already exists");
            }
            RepositoryError::unexpected(err.to_string())
        })?;

        Ok(Self::into_user(record))
    }

    async fn get(&self, id: UserId) -> Result<User, RepositoryError> {
        let record = query_as::<_, UserRecord>(
            "SELECT id, username, uuid, created_at FROM users WHERE id = ?",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| RepositoryError::unexpected(err.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(Self::into_user(record))
    }
}

#[derive(Clone)]
pub struct SqlTokenRepository {
    pool: DatabasePool,
}

impl SqlTokenRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn into_token(record: TokenRecord) -> Token {
        Token {
            id: TokenId::from(record.id),
            user_id: UserId::from(record.user_id),
            token_hash: record.token_hash,
            name: record.name,
            revoked_at: record.revoked_at,
            created_at: record.created_at,
        }
    }
}

#[async_trait]
impl TokenRepository for SqlTokenRepository {
    async fn insert(&self, token: NewToken) -> Result<Token, RepositoryError> {
        let record = query_as::<_, TokenRecord>(
            r"INSERT INTO tokens (user_id, token_hash, name, created_at)
              VALUES (?, ?, ?, ?)
              RETURNING id, user_id, token_hash, name, revoked_at, created_at",
        )
        .bind(token.user_id.into_inner())
        .bind(&token.token_hash)
        .bind(&token.name)
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

        Ok(Self::into_token(record))
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> Result<Token, RepositoryError> {
        let record = query_as::<_, TokenRecord>(
            r"SELECT id, user_id, token_hash, name, revoked_at, created_at
              FROM tokens WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| RepositoryError::unexpected(err.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(Self::into_token(record))
    }
}

#[derive(sqlx::FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    uuid: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct TokenRecord {
    id: i64,
    user_id: i64,
    token_hash: String,
    name: String,
    revoked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}
