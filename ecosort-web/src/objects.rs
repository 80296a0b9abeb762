//! Display text for detected objects
//!
//! The result is stored verbatim in the history. When detection fails the text
//! describes the failure instead, so it must not be parsed back into labels.

use crate::vision::{DetectedObject, VisionError};

/// Text stored when the service found no objects
pub const NOT_DETECTED: &str = "not detected";

/// Comma-separated, lower-cased labels in detection order
pub fn describe_objects(objects: &[DetectedObject]) -> String {
    let labels: Vec<String> = objects
        .iter()
        .map(|o| o.label.trim().to_lowercase())
        .filter(|label| !label.is_empty())
        .collect();

    if labels.is_empty() {
        NOT_DETECTED.to_string()
    } else {
        labels.join(", ")
    }
}

/// Same as [`describe_objects`], with errors turned into diagnostic text
pub fn describe_detection(result: &Result<Vec<DetectedObject>, VisionError>) -> String {
    match result {
        Ok(objects) => describe_objects(objects),
        Err(e) => format!("error detecting objects: {}", e),
    }
}
