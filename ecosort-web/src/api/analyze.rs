//! POST /analyze: classify an uploaded image
//!
//! Validation failures are 400s. Vision failures are reported inline in a 200
//! response. A history write failure is logged and reported through
//! `recorded: false`; the classification is still returned.

use axum::{
    extract::{ConnectInfo, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;

use crate::analysis::analyze_image;
use crate::db::NewRecord;
use crate::error::{ApiError, ApiResult};
use crate::upload::stage_image;
use crate::AppState;

/// Client address used when the peer address is not available
pub const UNKNOWN_CLIENT: &str = "unknown";

/// POST /analyze response
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// ORGANIC, INORGANIC, MIXED, UNDETERMINED, or an error description
    pub result: String,
    /// Detected object labels, "not detected", or an error description
    pub detected_objects: String,
    /// Whether a history record was written
    pub recorded: bool,
}

/// POST /analyze
pub async fn analyze(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    multipart: Multipart,
) -> ApiResult<Json<AnalyzeResponse>> {
    let client_ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    let staged = stage_image(multipart, &state.uploads).await?;
    let image = staged
        .read_bytes()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to read staged upload: {}", e)))?;

    let outcome = analyze_image(state.vision.as_ref(), &state.classifier, &image).await;

    tracing::info!(
        file_name = %staged.file_name(),
        size = staged.size(),
        client_ip = %client_ip,
        result = %outcome.verdict.result_text(),
        detected_objects = %outcome.detected_objects,
        "Image analyzed"
    );

    let mut recorded = false;
    if let Some(waste_type) = outcome.verdict.recordable() {
        let record = NewRecord {
            waste_type,
            client_ip: client_ip.clone(),
            image,
            detected_objects: outcome.detected_objects.clone(),
        };
        match state.history.append(record).await {
            Ok(record_id) => {
                recorded = true;
                tracing::info!(record_id, waste_type = %waste_type, client_ip = %client_ip, "Classification saved to history");
            }
            Err(e) => {
                tracing::error!(error = %e, waste_type = %waste_type, "Failed to save classification to history");
            }
        }
    }

    // Removes the staged file
    drop(staged);

    Ok(Json(AnalyzeResponse {
        result: outcome.verdict.result_text(),
        detected_objects: outcome.detected_objects,
        recorded,
    }))
}

/// Build analyze routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze))
}
