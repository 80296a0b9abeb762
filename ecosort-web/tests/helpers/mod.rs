//! Shared helpers for ecosort-web integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use ecosort_web::classifier::{Classifier, WasteType};
use ecosort_web::db::{init_database_pool, HistoryStore, NewRecord};
use ecosort_web::upload::UploadSettings;
use ecosort_web::vision::{DetectedObject, ImageAnalysis, VisionError, VisionService};
use ecosort_web::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub const BOUNDARY: &str = "ecosort-test-boundary";

/// Smallest byte sequence `infer` recognizes as PNG
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x01];

/// Vision service returning canned answers and counting calls
#[derive(Default)]
pub struct FakeVision {
    pub tags: Vec<String>,
    pub captions: Vec<String>,
    pub objects: Vec<String>,
    pub analysis_error: Option<String>,
    pub detection_error: Option<String>,
    calls: AtomicUsize,
}

impl FakeVision {
    pub fn with_tags(tags: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn objects(mut self, objects: &[&str]) -> Self {
        self.objects = objects.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn captions(mut self, captions: &[&str]) -> Self {
        self.captions = captions.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn failing_analysis(mut self, message: &str) -> Self {
        self.analysis_error = Some(message.to_string());
        self
    }

    pub fn failing_detection(mut self, message: &str) -> Self {
        self.detection_error = Some(message.to_string());
        self
    }

    /// Total analyze + detect calls received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionService for FakeVision {
    async fn analyze(&self, _image: &[u8]) -> Result<ImageAnalysis, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.analysis_error {
            return Err(VisionError::Network(message.clone()));
        }
        Ok(ImageAnalysis {
            tags: self.tags.clone(),
            captions: self.captions.clone(),
            categories: Vec::new(),
        })
    }

    async fn detect_objects(&self, _image: &[u8]) -> Result<Vec<DetectedObject>, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.detection_error {
            return Err(VisionError::Network(message.clone()));
        }
        Ok(self
            .objects
            .iter()
            .map(|label| DetectedObject {
                label: label.clone(),
                confidence: 0.9,
            })
            .collect())
    }
}

/// A service instance backed by a temporary database and upload directory
pub struct TestApp {
    pub state: AppState,
    pub vision: Arc<FakeVision>,
    pub upload_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestApp {
    pub async fn new(vision: FakeVision) -> Self {
        let temp_dir = TempDir::new().expect("Should create temp dir");
        let pool = init_database_pool(&temp_dir.path().join("ecosort.db"))
            .await
            .expect("Should create test database");

        let upload_dir = temp_dir.path().join("uploads");
        let uploads = UploadSettings {
            upload_dir: upload_dir.clone(),
            max_upload_bytes: 1024 * 1024,
        };

        let vision = Arc::new(vision);
        let state = AppState::new(
            HistoryStore::new(pool),
            Classifier::with_default_keywords(),
            vision.clone(),
            uploads,
        );

        Self {
            state,
            vision,
            upload_dir,
            _temp_dir: temp_dir,
        }
    }

    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    pub fn history(&self) -> &HistoryStore {
        &self.state.history
    }

    /// Files left behind in the upload directory
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(&self.upload_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Insert `count` records directly through the store
    pub async fn seed(&self, count: usize) -> Vec<i64> {
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let id = self
                .history()
                .append(NewRecord {
                    waste_type: WasteType::Organic,
                    client_ip: "10.0.0.1".to_string(),
                    image: PNG_BYTES.to_vec(),
                    detected_objects: format!("object {}", i),
                })
                .await
                .expect("Should append record");
            ids.push(id);
        }
        ids
    }
}

/// Build a multipart body with one file field
///
/// `file_name: None` omits the `filename` parameter entirely.
pub fn multipart_body(field: &str, file_name: Option<&str>, content: &[u8]) -> Vec<u8> {
    let disposition = match file_name {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
        None => format!("form-data; name=\"{}\"", field),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// POST /analyze with a single file field
pub fn analyze_request(field: &str, file_name: Option<&str>, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field, file_name, content)))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect()
        .await
        .expect("Should read body")
        .to_bytes()
        .to_vec()
}

pub async fn extract_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).expect("Should parse JSON")
}

pub async fn extract_text(body: Body) -> String {
    String::from_utf8(body_bytes(body).await).expect("Body should be UTF-8")
}
