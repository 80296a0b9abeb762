//! Image analysis: vision call, classification and object naming for one upload

use crate::classifier::{Classifier, WasteType};
use crate::objects;
use crate::vision::VisionService;

/// Classification result, or the text describing why it failed
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Classified(WasteType),
    Failed(String),
}

impl Verdict {
    /// Text returned to the client in the `result` field
    pub fn result_text(&self) -> String {
        match self {
            Verdict::Classified(waste_type) => waste_type.as_str().to_string(),
            Verdict::Failed(message) => message.clone(),
        }
    }

    /// Waste type to record, if the classification is conclusive
    pub fn recordable(&self) -> Option<WasteType> {
        match self {
            Verdict::Classified(waste_type) if waste_type.is_conclusive() => Some(*waste_type),
            _ => None,
        }
    }
}

/// Everything derived from one image
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub verdict: Verdict,
    pub detected_objects: String,
}

/// Run both vision requests and derive the verdict and object text
///
/// Vision failures never escape: they become inline text in the outcome.
pub async fn analyze_image(
    vision: &dyn VisionService,
    classifier: &Classifier,
    image: &[u8],
) -> AnalysisOutcome {
    let (analysis, detection) = tokio::join!(vision.analyze(image), vision.detect_objects(image));

    let verdict = match analysis {
        Ok(analysis) => Verdict::Classified(classifier.classify_analysis(&analysis)),
        Err(e) => {
            tracing::warn!(error = %e, "Image analysis failed");
            Verdict::Failed(format!("error analyzing image: {}", e))
        }
    };

    if let Err(e) = &detection {
        tracing::warn!(error = %e, "Object detection failed");
    }

    AnalysisOutcome {
        verdict,
        detected_objects: objects::describe_detection(&detection),
    }
}
