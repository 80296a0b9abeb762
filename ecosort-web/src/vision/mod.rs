//! Vision service adapter
//!
//! The classifier never talks to the cloud service directly: handlers hold an
//! `Arc<dyn VisionService>` injected at startup, so tests can substitute a fake.

mod azure_client;

pub use azure_client::{AzureVisionClient, VisionSettings};

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

/// Vision service errors
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Tags and captions describing one image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageAnalysis {
    /// Tag names as returned by the service
    pub tags: Vec<String>,
    /// Caption sentences, best first
    pub captions: Vec<String>,
    /// Category names (informational only)
    pub categories: Vec<String>,
}

impl ImageAnalysis {
    /// Lower-cased tag set
    pub fn tag_set(&self) -> HashSet<String> {
        self.tags.iter().map(|t| t.to_lowercase()).collect()
    }

    /// Captions lower-cased and concatenated, each followed by one space
    pub fn caption_text(&self) -> String {
        let mut text = String::new();
        for caption in &self.captions {
            text.push_str(&caption.to_lowercase());
            text.push(' ');
        }
        text
    }
}

/// One object located in the image
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedObject {
    pub label: String,
    pub confidence: f64,
}

/// External image-tagging service
#[async_trait]
pub trait VisionService: Send + Sync {
    /// Request tags, captions and categories for an image
    async fn analyze(&self, image: &[u8]) -> Result<ImageAnalysis, VisionError>;

    /// Request object detection for an image
    async fn detect_objects(&self, image: &[u8]) -> Result<Vec<DetectedObject>, VisionError>;
}
