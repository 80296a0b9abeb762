//! Azure Computer Vision client
//!
//! Uses the v3.2 REST endpoints:
//! - `POST {endpoint}/vision/v3.2/analyze` for tags, description and categories
//! - `POST {endpoint}/vision/v3.2/detect` for object detection
//!
//! Images are sent as `application/octet-stream` bodies.

use super::{DetectedObject, ImageAnalysis, VisionError, VisionService};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const API_PATH: &str = "vision/v3.2";
const ANALYZE_FEATURES: &str = "Tags,Description,Categories";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const USER_AGENT: &str = concat!("EcoSort/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the vision service
#[derive(Debug, Clone)]
pub struct VisionSettings {
    /// Resource endpoint, e.g. `https://<name>.cognitiveservices.azure.com`
    pub endpoint: String,
    pub api_key: String,
    /// Language hint for tags and captions
    pub language: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    tags: Vec<TagDto>,
    #[serde(default)]
    description: Option<DescriptionDto>,
    #[serde(default)]
    categories: Vec<CategoryDto>,
}

#[derive(Debug, Deserialize)]
struct TagDto {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DescriptionDto {
    #[serde(default)]
    captions: Vec<CaptionDto>,
}

#[derive(Debug, Deserialize)]
struct CaptionDto {
    text: String,
}

#[derive(Debug, Deserialize)]
struct CategoryDto {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    objects: Vec<ObjectDto>,
}

#[derive(Debug, Deserialize)]
struct ObjectDto {
    object: String,
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Azure Computer Vision API client
pub struct AzureVisionClient {
    http_client: reqwest::Client,
    settings: VisionSettings,
}

impl AzureVisionClient {
    pub fn new(settings: VisionSettings) -> Result<Self, VisionError> {
        if !settings.endpoint.starts_with("http://") && !settings.endpoint.starts_with("https://") {
            return Err(VisionError::Config(format!(
                "Vision endpoint must be an http(s) URL: {}",
                settings.endpoint
            )));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| VisionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            settings,
        })
    }

    fn url(&self, operation: &str) -> String {
        format!(
            "{}/{}/{}",
            self.settings.endpoint.trim_end_matches('/'),
            API_PATH,
            operation
        )
    }

    async fn post_image(
        &self,
        operation: &str,
        query: &[(&str, &str)],
        image: &[u8],
    ) -> Result<reqwest::Response, VisionError> {
        let response = self
            .http_client
            .post(self.url(operation))
            .query(query)
            .header(SUBSCRIPTION_KEY_HEADER, self.settings.api_key.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| VisionError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) if !parsed.error.code.is_empty() => {
                format!("{}: {}", parsed.error.code, parsed.error.message)
            }
            Ok(parsed) => parsed.error.message,
            Err(_) => body,
        };

        Err(VisionError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl VisionService for AzureVisionClient {
    async fn analyze(&self, image: &[u8]) -> Result<ImageAnalysis, VisionError> {
        tracing::debug!(bytes = image.len(), "Requesting image analysis");

        let response = self
            .post_image(
                "analyze",
                &[
                    ("visualFeatures", ANALYZE_FEATURES),
                    ("language", self.settings.language.as_str()),
                ],
                image,
            )
            .await?;

        let parsed: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| VisionError::Parse(e.to_string()))?;

        let analysis = ImageAnalysis {
            tags: parsed.tags.into_iter().map(|t| t.name).collect(),
            captions: parsed
                .description
                .map(|d| d.captions.into_iter().map(|c| c.text).collect())
                .unwrap_or_default(),
            categories: parsed.categories.into_iter().map(|c| c.name).collect(),
        };

        tracing::debug!(
            tags = ?analysis.tags,
            captions = ?analysis.captions,
            categories = ?analysis.categories,
            "Image analysis received"
        );

        Ok(analysis)
    }

    async fn detect_objects(&self, image: &[u8]) -> Result<Vec<DetectedObject>, VisionError> {
        tracing::debug!(bytes = image.len(), "Requesting object detection");

        let response = self.post_image("detect", &[], image).await?;

        let parsed: DetectResponse = response
            .json()
            .await
            .map_err(|e| VisionError::Parse(e.to_string()))?;

        Ok(parsed
            .objects
            .into_iter()
            .map(|o| DetectedObject {
                label: o.object,
                confidence: o.confidence,
            })
            .collect())
    }
}
