use crate::{CasOutcome, CredentialStore, Result as StoreResult, StoredEntry};

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const BUSY_TIMEOUT_SECS: u64 = 5;

/// SQLite-backed credential store.
///
/// Each compare-and-swap runs in one write transaction that draws the next
/// version from `credential_version_seq` and applies a conditional write, so
/// several processes sharing one database file still see exactly one winner
/// per version, and versions are never reused across purges.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `path` and apply migrations.
    pub async fn connect(path: &Path) -> StoreResult<Self> {
        info!("Opening credential store: {}", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal)
                    .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS)),
            )
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Single-connection in-memory database, mainly for tests.
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1) // In-memory needs single connection
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(":memory:")
                    .create_if_missing(true),
            )
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn to_millis(at: Option<DateTime<Utc>>) -> Option<i64> {
    at.map(|at| at.timestamp_millis())
}

fn from_millis(millis: Option<i64>) -> Option<DateTime<Utc>> {
    millis.and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn get(&self, key: &str) -> StoreResult<Option<StoredEntry>> {
        let now = Utc::now().timestamp_millis();

        let row: Option<(String, i64, Option<i64>)> = sqlx::query_as(
            r#"
              SELECT value, version, expires_at
              FROM credential_entries
              WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)
              "#,
        )
        .bind(key)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(value, version, expires_at)| StoredEntry {
            value,
            version: version as u64,
            expires_at: from_millis(expires_at),
        }))
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: Option<u64>,
        value: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<CasOutcome> {
        let now = Utc::now().timestamp_millis();
        let expires_at = to_millis(expires_at);

        let mut tx = self.pool.begin().await?;

        // First statement writes, so the transaction holds the write lock
        // from here until commit or rollback.
        let version: i64 = sqlx::query_scalar(
            r#"
              UPDATE credential_version_seq
              SET last_version = last_version + 1
              WHERE id = 1
              RETURNING last_version
              "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        let written: Option<i64> = match expected_version {
            // Insert, or take over a row whose entry has already expired.
            None => {
                sqlx::query_scalar(
                    r#"
                      INSERT INTO credential_entries (key, value, version, expires_at)
                      VALUES (?, ?, ?, ?)
                      ON CONFLICT(key) DO UPDATE SET
                          value = excluded.value,
                          version = excluded.version,
                          expires_at = excluded.expires_at
                      WHERE credential_entries.expires_at IS NOT NULL
                        AND credential_entries.expires_at <= ?
                      RETURNING version
                      "#,
                )
                .bind(key)
                .bind(&value)
                .bind(version)
                .bind(expires_at)
                .bind(now)
                .fetch_optional(&mut *tx)
                .await?
            }
            Some(expected) => {
                sqlx::query_scalar(
                    r#"
                      UPDATE credential_entries
                      SET value = ?, version = ?, expires_at = ?
                      WHERE key = ?
                        AND version = ?
                        AND (expires_at IS NULL OR expires_at > ?)
                      RETURNING version
                      "#,
                )
                .bind(&value)
                .bind(version)
                .bind(expires_at)
                .bind(key)
                .bind(expected as i64)
                .bind(now)
                .fetch_optional(&mut *tx)
                .await?
            }
        };

        match written {
            Some(version) => {
                tx.commit().await?;
                Ok(CasOutcome::Swapped {
                    version: version as u64,
                })
            }
            None => {
                tx.rollback().await?;
                Ok(CasOutcome::Conflict)
            }
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM credential_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM credential_entries WHERE expires_at IS NOT NULL AND expires_at <= ?",
        )
        .bind(now.timestamp_millis())
        .execute(&self.pool)
        .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!("Purged {removed} expired entries from sqlite store");
        }

        Ok(removed)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
