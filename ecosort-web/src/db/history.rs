//! Classification history store
//!
//! Rows are append-only: nothing here updates or deletes a record. Each
//! operation borrows one pooled connection for its duration.

use super::StorageError;
use crate::classifier::WasteType;
use crate::pagination::{calculate_pagination, total_pages};
use chrono::{NaiveDate, NaiveTime};
use ecosort_common::time::{self, DATE_FORMAT, TIME_FORMAT};
use sqlx::{SqliteConnection, SqlitePool};

/// A classification to be recorded; the store stamps the date and time
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub waste_type: WasteType,
    pub client_ip: String,
    pub image: Vec<u8>,
    pub detected_objects: String,
}

/// A recorded classification
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRecord {
    pub id: i64,
    pub waste_type: WasteType,
    pub recorded_date: NaiveDate,
    pub recorded_time: NaiveTime,
    pub client_ip: String,
    pub image: Vec<u8>,
    pub detected_objects: String,
}

/// One window of the history, newest first
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub records: Vec<ClassificationRecord>,
    /// Total number of records in the store
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: i64,
    waste_type: String,
    recorded_date: String,
    recorded_time: String,
    client_ip: String,
    image: Vec<u8>,
    detected_objects: String,
}

impl TryFrom<HistoryRow> for ClassificationRecord {
    type Error = StorageError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let waste_type = row
            .waste_type
            .parse::<WasteType>()
            .map_err(|e| StorageError::Corrupt(format!("row {}: {}", row.id, e)))?;
        let recorded_date = NaiveDate::parse_from_str(&row.recorded_date, DATE_FORMAT)
            .map_err(|e| StorageError::Corrupt(format!("row {} date: {}", row.id, e)))?;
        let recorded_time = NaiveTime::parse_from_str(&row.recorded_time, TIME_FORMAT)
            .map_err(|e| StorageError::Corrupt(format!("row {} time: {}", row.id, e)))?;

        Ok(ClassificationRecord {
            id: row.id,
            waste_type,
            recorded_date,
            recorded_time,
            client_ip: row.client_ip,
            image: row.image,
            detected_objects: row.detected_objects,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, waste_type, recorded_date, recorded_time, client_ip, image, detected_objects \
     FROM classification_history";

/// Persistent classification history
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Record a conclusive classification; returns the new row id
    pub async fn append(&self, record: NewRecord) -> Result<i64, StorageError> {
        if !record.waste_type.is_conclusive() {
            return Err(StorageError::Inconclusive);
        }

        let now = time::now_local();
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO classification_history
                (waste_type, recorded_date, recorded_time, client_ip, image, detected_objects)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.waste_type.as_str())
        .bind(time::format_date(now.date()))
        .bind(time::format_time(now.time()))
        .bind(&record.client_ip)
        .bind(&record.image)
        .bind(&record.detected_objects)
        .execute(&mut *conn)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(record_id = id, waste_type = %record.waste_type, "Classification recorded");

        Ok(id)
    }

    /// Total number of records
    pub async fn count(&self) -> Result<i64, StorageError> {
        let mut conn = self.pool.acquire().await?;
        count_rows(&mut conn).await
    }

    /// The `page`-th window (1-indexed) of `page_size` records, newest first
    ///
    /// A page past the end yields no records; `total` is still reported.
    pub async fn list(&self, page: i64, page_size: i64) -> Result<HistoryPage, StorageError> {
        if page < 1 {
            return Err(StorageError::InvalidArgument(format!(
                "page must be at least 1, got {}",
                page
            )));
        }
        if page_size < 1 {
            return Err(StorageError::InvalidArgument(format!(
                "page_size must be at least 1, got {}",
                page_size
            )));
        }
        let offset = (page - 1).checked_mul(page_size).ok_or_else(|| {
            StorageError::InvalidArgument(format!("page {} is out of range", page))
        })?;

        let mut conn = self.pool.acquire().await?;
        let total = count_rows(&mut conn).await?;
        let records = fetch_window(&mut conn, page_size, offset).await?;

        Ok(HistoryPage {
            records,
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
        })
    }

    /// Like [`list`](Self::list), but an out-of-range page is clamped to the
    /// nearest existing one instead of coming back empty
    ///
    /// The count and the window are read on the same connection.
    pub async fn list_clamped(
        &self,
        requested_page: i64,
        page_size: i64,
    ) -> Result<HistoryPage, StorageError> {
        if page_size < 1 {
            return Err(StorageError::InvalidArgument(format!(
                "page_size must be at least 1, got {}",
                page_size
            )));
        }

        let mut conn = self.pool.acquire().await?;
        let total = count_rows(&mut conn).await?;
        let pagination = calculate_pagination(total, requested_page, page_size);
        let records = fetch_window(&mut conn, page_size, pagination.offset).await?;

        Ok(HistoryPage {
            records,
            total,
            page: pagination.page,
            page_size,
            total_pages: pagination.total_pages,
        })
    }

    /// Fetch one record by id
    pub async fn get(&self, id: i64) -> Result<Option<ClassificationRecord>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let row: Option<HistoryRow> = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(ClassificationRecord::try_from).transpose()
    }
}

async fn count_rows(conn: &mut SqliteConnection) -> Result<i64, StorageError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM classification_history")
        .fetch_one(&mut *conn)
        .await?;
    Ok(total)
}

async fn fetch_window(
    conn: &mut SqliteConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<ClassificationRecord>, StorageError> {
    let rows: Vec<HistoryRow> =
        sqlx::query_as(&format!("{} ORDER BY id DESC LIMIT ? OFFSET ?", SELECT_COLUMNS))
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *conn)
            .await?;

    rows.into_iter().map(ClassificationRecord::try_from).collect()
}
