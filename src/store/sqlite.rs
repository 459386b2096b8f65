use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info};

use crate::core::error::{QuoteError, Stage};
use crate::core::store::{PersistedRate, RateStore};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS cotacoes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bid TEXT NOT NULL,
        timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
    )
"#;

/// Connections opened up front so that concurrent requests do not pay for
/// opening one inside the persist deadline.
pub const WARM_CONNECTIONS: u32 = 4;

/// Append-only rate table backed by a SQLite file.
///
/// The pool is shared by every request of the server; SQLite serialises the
/// writers, so no extra locking happens here.
pub struct SqliteRateStore {
    pool: SqlitePool,
    persist_timeout: Duration,
}

impl SqliteRateStore {
    pub fn connect_options(path: &Path) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
    }

    /// Opens the database at `path`, creating the file if missing.
    pub async fn connect(path: &Path, persist_timeout: Duration) -> Result<Self, QuoteError> {
        let pool = SqlitePoolOptions::new()
            .min_connections(WARM_CONNECTIONS)
            .connect_with(Self::connect_options(path))
            .await?;

        // Holding each one forces a distinct connection to open now.
        let mut warm = Vec::with_capacity(WARM_CONNECTIONS as usize);
        for _ in 0..WARM_CONNECTIONS {
            warm.push(pool.acquire().await?);
        }
        drop(warm);
        info!(path = %path.display(), "Opened rate database");

        Ok(Self::from_pool(pool, persist_timeout))
    }

    pub fn from_pool(pool: SqlitePool, persist_timeout: Duration) -> Self {
        SqliteRateStore {
            pool,
            persist_timeout,
        }
    }

    pub async fn count(&self) -> Result<i64, QuoteError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cotacoes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Most recently appended row, if any.
    pub async fn latest(&self) -> Result<Option<PersistedRate>, QuoteError> {
        let rate = sqlx::query_as::<_, PersistedRate>(
            "SELECT id, bid, timestamp FROM cotacoes ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(rate)
    }

    /// Appends `bid` unless the deadline passes first.
    ///
    /// The deadline covers getting a connection and running the INSERT. Once
    /// the INSERT is in, the COMMIT is always awaited: a COMMIT that was sent
    /// cannot be called back, so a timeout is only reported while nothing has
    /// been committed. A transaction dropped before its COMMIT rolls back.
    async fn insert(&self, bid: &str) -> Result<(), QuoteError> {
        let deadline = Instant::now() + self.persist_timeout;
        let timed_out = || QuoteError::timeout(Stage::Persist, self.persist_timeout);

        let mut conn = timeout_at(deadline, self.pool.acquire())
            .await
            .map_err(|_| timed_out())??;
        // Deferred BEGIN takes no lock
        let mut tx = sqlx::Connection::begin(&mut *conn).await?;

        match timeout_at(
            deadline,
            sqlx::query("INSERT INTO cotacoes (bid) VALUES (?)")
                .bind(bid)
                .execute(&mut *tx),
        )
        .await
        {
            Ok(result) => {
                result?;
            }
            Err(_) => {
                // Dropping `tx` queues the ROLLBACK behind the pending INSERT.
                debug!(%bid, "Persist deadline passed before the insert finished");
                return Err(timed_out());
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl RateStore for SqliteRateStore {
    async fn initialize_schema(&self) -> Result<(), QuoteError> {
        sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
        debug!("Rate table ready");
        Ok(())
    }

    async fn persist_bid(&self, bid: &str) -> Result<(), QuoteError> {
        self.insert(bid).await?;
        debug!(%bid, "Persisted bid");
        Ok(())
    }
}
