//! SQLite persistence for transformed ESG records.

use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Pool, Sqlite,
};
use std::str::FromStr;
use tokio::time::Duration;
use tracing::{debug, info, instrument};

use crate::transform::EsgRecord;
use crate::TARGET_DB;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Opens (creating if missing) the database file at `path`.
    #[instrument(target = "db_query", level = "info")]
    pub async fn open(path: &str) -> Result<Self> {
        info!(target: TARGET_DB, "Creating database pool for: {}", path);

        let connect_options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .synchronous(SqliteSynchronous::Normal);

        Self::connect(connect_options, 5).await
    }

    /// A private database that lives as long as the returned handle.
    pub async fn in_memory() -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // Every pooled connection to :memory: would see its own database.
        Self::connect(connect_options, 1).await
    }

    async fn connect(connect_options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .context("Failed to create database pool")?;

        info!(target: TARGET_DB, "Database pool created");
        Ok(Database { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Writes every record to `table` in one transaction, creating the table if needed.
    #[instrument(target = "db_query", level = "info", skip(self, records), fields(count = records.len()))]
    pub async fn insert_records(&self, table: &str, records: &[EsgRecord]) -> Result<u64> {
        let table = validate_table_name(table)?;
        let mut tx = self.pool.begin().await?;

        let create = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                ext8_ticker TEXT NOT NULL,
                ticker TEXT NOT NULL,
                exchange TEXT,
                scores TEXT NOT NULL,
                timestamp_created_utc TEXT NOT NULL
            )
            "#
        );
        sqlx::query(&create).execute(&mut *tx).await?;

        let insert = format!(
            "INSERT INTO {table} (name, ext8_ticker, ticker, exchange, scores, timestamp_created_utc) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        );
        let mut inserted = 0;
        for record in records {
            let scores = serde_json::to_string(&record.scores)?;
            let result = sqlx::query(&insert)
                .bind(&record.name)
                .bind(&record.ext8_ticker)
                .bind(&record.ticker)
                .bind(record.exchange.as_deref())
                .bind(scores)
                .bind(record.timestamp_created_utc.to_rfc3339())
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to insert {}", record.ext8_ticker))?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        debug!(target: TARGET_DB, "Inserted {} rows into {}", inserted, table);
        Ok(inserted)
    }

    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        let table = validate_table_name(table)?;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Table names are interpolated into SQL, so only plain identifiers are accepted.
fn validate_table_name(table: &str) -> Result<&str> {
    let mut chars = table.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(table)
    } else {
        Err(anyhow::anyhow!("Invalid table name: {:?}", table))
    }
}
