use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub type DatabaseDriver = sqlx::Sqlite;
pub type DatabasePool = sqlx::SqlitePool;

#[derive(Clone)]
pub struct Database {
    pool: DatabasePool,
}

impl Database {
    /// Connect to the given sqlite database (created if missing) and run
    /// any pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        // An in-memory database lives and dies with its connection, so it
        // gets exactly one that never expires.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn clone_pool(&self) -> DatabasePool {
        self.pool.clone()
    }
}
