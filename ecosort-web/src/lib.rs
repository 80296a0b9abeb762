//! ecosort-web library interface
//!
//! Exposes the application state and router so integration tests can drive the
//! service without binding a socket.

pub mod analysis;
pub mod api;
pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod objects;
pub mod pagination;
pub mod upload;
pub mod vision;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::classifier::Classifier;
use crate::db::HistoryStore;
use crate::upload::UploadSettings;
use crate::vision::VisionService;

/// Application state shared across handlers
///
/// Everything here is immutable after startup; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Classification history
    pub history: HistoryStore,
    /// Keyword classifier
    pub classifier: Arc<Classifier>,
    /// External vision service
    pub vision: Arc<dyn VisionService>,
    /// Upload staging settings
    pub uploads: Arc<UploadSettings>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        history: HistoryStore,
        classifier: Classifier,
        vision: Arc<dyn VisionService>,
        uploads: UploadSettings,
    ) -> Self {
        Self {
            history,
            classifier: Arc::new(classifier),
            vision,
            uploads: Arc::new(uploads),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.uploads.max_upload_bytes;

    Router::new()
        // UI routes (HTML pages)
        .merge(api::ui_routes())
        // API routes
        .merge(api::analyze_routes())
        .merge(api::history_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
