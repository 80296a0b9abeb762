//! Database access for ecosort-web
//!
//! A single SQLite table holds the classification history.

pub mod history;

pub use history::{ClassificationRecord, HistoryPage, HistoryStore, NewRecord};

use ecosort_common::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// History store errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Connection, query or constraint failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Attempt to record an UNDETERMINED classification
    #[error("Inconclusive classifications are not recorded")]
    Inconclusive,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A stored row could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Open (or create) the database and ensure the schema exists
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let newly_created = !db_path.exists();

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        tracing::info!("Initialized new database: {}", db_path.display());
    } else {
        tracing::info!("Opened existing database: {}", db_path.display());
    }

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the history table if it doesn't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS classification_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            waste_type TEXT NOT NULL CHECK (waste_type IN ('ORGANIC', 'INORGANIC', 'MIXED')),
            recorded_date TEXT NOT NULL,
            recorded_time TEXT NOT NULL,
            client_ip TEXT NOT NULL,
            image BLOB NOT NULL,
            detected_objects TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("Database tables initialized (classification_history)");

    Ok(())
}
