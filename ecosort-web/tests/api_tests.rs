//! Integration tests for ecosort-web HTTP endpoints
//!
//! Tests cover:
//! - POST /analyze: classification, persistence rules, upload validation
//! - Vision and storage failures reported without failing the request
//! - GET /history, /api/history, /history/:id/image
//! - GET / and /health

mod helpers;

use axum::extract::ConnectInfo;
use axum::http::{header, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use helpers::*;
use std::net::SocketAddr;
use tower::util::ServiceExt; // for `oneshot` method

// =============================================================================
// POST /analyze
// =============================================================================

#[tokio::test]
async fn test_organic_image_is_classified_and_recorded() {
    let app = TestApp::new(FakeVision::with_tags(&["Fruta", "comida"]).objects(&["Banana", "Cup"])).await;

    let response = app
        .router()
        .oneshot(analyze_request("image", Some("peel.jpg"), PNG_BYTES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["result"], "ORGANIC");
    assert_eq!(body["detected_objects"], "banana, cup");
    assert_eq!(body["recorded"], true);

    assert_eq!(app.history().count().await.unwrap(), 1);
    let page = app.history().list(1, 8).await.unwrap();
    let record = &page.records[0];
    assert_eq!(record.image, PNG_BYTES);
    assert_eq!(record.detected_objects, "banana, cup");
    assert_eq!(record.client_ip, "unknown");

    assert_eq!(app.vision.calls(), 2);
    assert_eq!(app.staged_files(), 0, "Staged upload should be removed");
}

#[tokio::test]
async fn test_mixed_image_is_recorded() {
    let app = TestApp::new(FakeVision::with_tags(&["fruta", "botella"])).await;

    let response = app
        .router()
        .oneshot(analyze_request("image", Some("both.png"), PNG_BYTES))
        .await
        .unwrap();

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["result"], "MIXED");
    assert_eq!(body["detected_objects"], "not detected");
    assert_eq!(body["recorded"], true);
    assert_eq!(app.history().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_caption_text_is_matched() {
    let app = TestApp::new(FakeVision::default().captions(&["Una botella de plástico"])).await;

    let response = app
        .router()
        .oneshot(analyze_request("image", Some("bottle.gif"), PNG_BYTES))
        .await
        .unwrap();

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["result"], "INORGANIC");
}

#[tokio::test]
async fn test_undetermined_image_is_not_recorded() {
    let app = TestApp::new(FakeVision::with_tags(&["cielo", "nube"])).await;

    let response = app
        .router()
        .oneshot(analyze_request("image", Some("sky.bmp"), PNG_BYTES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["result"], "UNDETERMINED");
    assert_eq!(body["recorded"], false);
    assert_eq!(app.history().count().await.unwrap(), 0);
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn test_client_ip_taken_from_connection() {
    let app = TestApp::new(FakeVision::with_tags(&["lata"])).await;

    let mut request = analyze_request("image", Some("can.jpeg"), PNG_BYTES);
    let peer: SocketAddr = "192.168.1.50:41234".parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = app.history().list(1, 8).await.unwrap();
    assert_eq!(page.records[0].client_ip, "192.168.1.50");
}

#[tokio::test]
async fn test_missing_image_field_is_bad_request() {
    let app = TestApp::new(FakeVision::with_tags(&["fruta"])).await;

    let response = app
        .router()
        .oneshot(analyze_request("file", Some("peel.png"), PNG_BYTES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(app.vision.calls(), 0);
}

#[tokio::test]
async fn test_empty_file_name_is_bad_request() {
    let app = TestApp::new(FakeVision::with_tags(&["fruta"])).await;

    let response = app
        .router()
        .oneshot(analyze_request("image", Some(""), PNG_BYTES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.vision.calls(), 0);
}

#[tokio::test]
async fn test_disallowed_extension_is_rejected_before_any_call() {
    let app = TestApp::new(FakeVision::with_tags(&["fruta"])).await;

    let response = app
        .router()
        .oneshot(analyze_request("image", Some("notes.txt"), PNG_BYTES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("File type not allowed"));

    assert_eq!(app.vision.calls(), 0);
    assert_eq!(app.history().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_upload_is_bad_request() {
    let app = TestApp::new(FakeVision::with_tags(&["fruta"])).await;

    let response = app
        .router()
        .oneshot(analyze_request("image", Some("empty.png"), b""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.vision.calls(), 0);
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = TestApp::new(FakeVision::with_tags(&["fruta"])).await;
    let oversized = vec![0u8; 2 * 1024 * 1024];

    let response = app
        .router()
        .oneshot(analyze_request("image", Some("big.png"), &oversized))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.vision.calls(), 0);
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn test_analysis_failure_reported_inline() {
    let app = TestApp::new(
        FakeVision::with_tags(&["fruta"])
            .objects(&["Bottle"])
            .failing_analysis("connection refused"),
    )
    .await;

    let response = app
        .router()
        .oneshot(analyze_request("image", Some("peel.png"), PNG_BYTES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let result = body["result"].as_str().unwrap();
    assert!(result.starts_with("error analyzing image:"), "got {}", result);
    assert!(result.contains("connection refused"));
    assert_eq!(body["detected_objects"], "bottle");
    assert_eq!(body["recorded"], false);
    assert_eq!(app.history().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_detection_failure_does_not_block_classification() {
    let app = TestApp::new(FakeVision::with_tags(&["botella"]).failing_detection("timed out")).await;

    let response = app
        .router()
        .oneshot(analyze_request("image", Some("bottle.png"), PNG_BYTES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["result"], "INORGANIC");
    assert!(body["detected_objects"]
        .as_str()
        .unwrap()
        .starts_with("error detecting objects:"));
    assert_eq!(body["recorded"], true);
}

#[tokio::test]
async fn test_storage_failure_still_returns_classification() {
    let app = TestApp::new(FakeVision::with_tags(&["fruta"])).await;
    sqlx::query("DROP TABLE classification_history")
        .execute(app.history().pool())
        .await
        .unwrap();

    let response = app
        .router()
        .oneshot(analyze_request("image", Some("peel.png"), PNG_BYTES))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["result"], "ORGANIC");
    assert_eq!(body["recorded"], false);
    assert_eq!(app.staged_files(), 0);
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn test_api_history_pages_newest_first() {
    let app = TestApp::new(FakeVision::default()).await;
    let ids = app.seed(17).await;

    let response = app.router().oneshot(get_request("/api/history")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 8);
    assert_eq!(body["total"], 17);
    assert_eq!(body["total_pages"], 3);

    let returned: Vec<i64> = body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    let expected: Vec<i64> = ids.iter().rev().take(8).copied().collect();
    assert_eq!(returned, expected);

    let first = &body["entries"][0];
    assert_eq!(first["waste_type"], "ORGANIC");
    assert_eq!(first["image_base64"], STANDARD.encode(PNG_BYTES));
    assert_eq!(first["image_mime"], "image/png");
}

#[tokio::test]
async fn test_api_history_last_page_has_remainder() {
    let app = TestApp::new(FakeVision::default()).await;
    let ids = app.seed(17).await;

    let response = app
        .router()
        .oneshot(get_request("/api/history?page=3"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["page"], 3);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], ids[0]);
}

#[tokio::test]
async fn test_api_history_clamps_out_of_range_pages() {
    let app = TestApp::new(FakeVision::default()).await;
    app.seed(17).await;

    let response = app
        .router()
        .oneshot(get_request("/api/history?page=99"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["page"], 3);

    let response = app
        .router()
        .oneshot(get_request("/api/history?page=0"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["entries"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_api_history_rejects_non_numeric_page() {
    let app = TestApp::new(FakeVision::default()).await;

    let response = app
        .router()
        .oneshot(get_request("/api/history?page=abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_api_history_empty_store() {
    let app = TestApp::new(FakeVision::default()).await;

    let response = app.router().oneshot(get_request("/api/history")).await.unwrap();
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["page"], 1);
    assert_eq!(body["total"], 0);
    assert_eq!(body["total_pages"], 0);
    assert!(body["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_history_page_embeds_images() {
    let app = TestApp::new(FakeVision::default()).await;
    app.seed(2).await;

    let response = app.router().oneshot(get_request("/history")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));

    let html = extract_text(response.into_body()).await;
    assert!(html.contains(&format!("data:image/png;base64,{}", STANDARD.encode(PNG_BYTES))));
    assert!(html.contains("Organic waste"));
    assert!(html.contains("Page 1 of 1"));
}

#[tokio::test]
async fn test_history_image_endpoint() {
    let app = TestApp::new(FakeVision::default()).await;
    let ids = app.seed(1).await;

    let response = app
        .router()
        .oneshot(get_request(&format!("/history/{}/image", ids[0])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(response.into_body()).await, PNG_BYTES);

    let response = app
        .router()
        .oneshot(get_request("/history/9999/image"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// =============================================================================
// UI and health
// =============================================================================

#[tokio::test]
async fn test_root_page_has_upload_form() {
    let app = TestApp::new(FakeVision::default()).await;

    let response = app.router().oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = extract_text(response.into_body()).await;
    assert!(html.contains(r#"name="image""#));
    assert!(html.contains("/analyze"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new(FakeVision::default()).await;

    let response = app.router().oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "ecosort-web");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_u64());
}
