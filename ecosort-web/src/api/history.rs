//! History views
//!
//! - GET /history?page=N: HTML page, newest first
//! - GET /api/history?page=N: the same window as JSON
//! - GET /history/:id/image: stored image bytes

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::api::ui::{escape_html, render_page};
use crate::classifier::WasteType;
use crate::db::ClassificationRecord;
use crate::error::{ApiError, ApiResult};
use crate::pagination::HISTORY_PAGE_SIZE;
use crate::AppState;
use ecosort_common::time::{format_date, format_time};

/// Query parameters for history views
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

/// One history entry as presented to clients
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub waste_type: WasteType,
    pub detected_objects: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM:SS`
    pub time: String,
    pub client_ip: String,
    pub image_mime: String,
    pub image_base64: String,
}

impl HistoryEntry {
    pub fn from_record(record: &ClassificationRecord) -> Self {
        Self {
            id: record.id,
            waste_type: record.waste_type,
            detected_objects: record.detected_objects.clone(),
            date: format_date(record.recorded_date),
            time: format_time(record.recorded_time),
            client_ip: record.client_ip.clone(),
            image_mime: image_mime(&record.image).to_string(),
            image_base64: STANDARD.encode(&record.image),
        }
    }
}

/// GET /api/history response
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
    pub entries: Vec<HistoryEntry>,
}

/// MIME type sniffed from magic bytes
fn image_mime(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream")
}

/// Load the requested window, clamping the page into range
async fn load_page(state: &AppState, requested_page: i64) -> ApiResult<HistoryResponse> {
    let page = state
        .history
        .list_clamped(requested_page, HISTORY_PAGE_SIZE)
        .await?;

    tracing::debug!(
        page = page.page,
        total = page.total,
        returned = page.records.len(),
        "History page loaded"
    );

    Ok(HistoryResponse {
        page: page.page,
        page_size: page.page_size,
        total: page.total,
        total_pages: page.total_pages,
        entries: page.records.iter().map(HistoryEntry::from_record).collect(),
    })
}

/// GET /api/history
pub async fn history_json(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    Ok(Json(load_page(&state, query.page).await?))
}

/// GET /history
pub async fn history_page(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Html<String>> {
    let history = load_page(&state, query.page).await?;
    Ok(Html(render_history(&history)))
}

/// GET /history/:id/image
pub async fn history_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let record = state
        .history
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("History record not found: {}", id)))?;

    let mime = image_mime(&record.image);
    Ok(([(header::CONTENT_TYPE, mime)], record.image).into_response())
}

fn render_history(history: &HistoryResponse) -> String {
    let mut cards = String::new();
    for entry in &history.entries {
        cards.push_str(&format!(
            r#"
        <div class="card">
            <img src="data:{mime};base64,{image}" alt="Record {id}">
            <div class="card-body">
                <div class="waste-type {css}">{label}</div>
                <div><strong>Objects:</strong> {objects}</div>
                <div><strong>Date:</strong> {date}</div>
                <div><strong>Time:</strong> {time}</div>
                <div><strong>IP:</strong> {ip}</div>
            </div>
        </div>"#,
            mime = entry.image_mime,
            image = entry.image_base64,
            id = entry.id,
            css = entry.waste_type.as_str().to_lowercase(),
            label = entry.waste_type.label(),
            objects = escape_html(&entry.detected_objects),
            date = entry.date,
            time = entry.time,
            ip = escape_html(&entry.client_ip),
        ));
    }

    if history.entries.is_empty() {
        cards.push_str(r#"<p class="empty">No classifications recorded yet.</p>"#);
    }

    let previous = if history.page > 1 {
        format!(r#"<a class="button" href="/history?page={}">&laquo; Previous</a>"#, history.page - 1)
    } else {
        String::new()
    };
    let next = if history.page < history.total_pages {
        format!(r#"<a class="button" href="/history?page={}">Next &raquo;</a>"#, history.page + 1)
    } else {
        String::new()
    };

    let body = format!(
        r#"
    <h2>Classification history</h2>
    <div class="grid">{cards}
    </div>
    <nav class="pager">
        {previous}
        <span>Page {page} of {total_pages} ({total} records)</span>
        {next}
    </nav>"#,
        cards = cards,
        previous = previous,
        next = next,
        page = history.page,
        total_pages = history.total_pages.max(1),
        total = history.total,
    );

    render_page("Classification history", &body)
}

/// Build history routes
pub fn history_routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(history_page))
        .route("/history/:id/image", get(history_image))
        .route("/api/history", get(history_json))
}
