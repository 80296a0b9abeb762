//! Waste classification by keyword membership
//!
//! An image is organic-flagged when any organic keyword is an exact tag or a
//! substring of the caption text, and inorganic-flagged the same way with the
//! inorganic list. Caption matching is a plain substring test, so a keyword
//! embedded in a longer word still matches.
//!
//! | organic | inorganic | result       |
//! |---------|-----------|--------------|
//! | yes     | no        | ORGANIC      |
//! | no      | yes       | INORGANIC    |
//! | yes     | yes       | MIXED        |
//! | no      | no        | UNDETERMINED |

use crate::vision::ImageAnalysis;
use ecosort_common::config::KeywordSection;
use ecosort_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

/// Built-in organic keywords (Spanish, matching the `es` language hint)
pub const DEFAULT_ORGANIC_KEYWORDS: &[&str] = &[
    "fruta", "verdura", "comida", "restos", "planta", "hoja", "pan", "cáscara", "pasto", "carne",
    "hueso", "pescado", "pollo", "arroz", "semilla", "limón", "rostro", "persona",
];

/// Built-in inorganic keywords
pub const DEFAULT_INORGANIC_KEYWORDS: &[&str] = &[
    "plástico", "botella", "metal", "lata", "vidrio", "papel", "cartón", "tela", "aluminio",
    "batería", "pilas", "envase", "bolsa", "electrónico", "cuaderno", "lentes", "gafas",
];

/// Classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WasteType {
    Organic,
    Inorganic,
    Mixed,
    Undetermined,
}

impl WasteType {
    /// Wire and storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteType::Organic => "ORGANIC",
            WasteType::Inorganic => "INORGANIC",
            WasteType::Mixed => "MIXED",
            WasteType::Undetermined => "UNDETERMINED",
        }
    }

    /// Human-readable label for the web pages
    pub fn label(&self) -> &'static str {
        match self {
            WasteType::Organic => "Organic waste",
            WasteType::Inorganic => "Inorganic waste",
            WasteType::Mixed => "May contain organic and inorganic waste",
            WasteType::Undetermined => "Waste type could not be determined",
        }
    }

    /// Only conclusive outcomes are recorded in the history
    pub fn is_conclusive(&self) -> bool {
        !matches!(self, WasteType::Undetermined)
    }

    fn from_flags(organic: bool, inorganic: bool) -> Self {
        match (organic, inorganic) {
            (true, false) => WasteType::Organic,
            (false, true) => WasteType::Inorganic,
            (true, true) => WasteType::Mixed,
            (false, false) => WasteType::Undetermined,
        }
    }
}

impl fmt::Display for WasteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WasteType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ORGANIC" => Ok(WasteType::Organic),
            "INORGANIC" => Ok(WasteType::Inorganic),
            "MIXED" => Ok(WasteType::Mixed),
            "UNDETERMINED" => Ok(WasteType::Undetermined),
            other => Err(Error::InvalidInput(format!("Unknown waste type: {}", other))),
        }
    }
}

/// Normalized keyword list (trimmed, lower-cased, de-duplicated)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    words: BTreeSet<String>,
}

impl KeywordSet {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// Any keyword is an exact tag or occurs inside the caption text
    pub fn matches(&self, tags: &HashSet<&str>, caption_text: &str) -> bool {
        self.words
            .iter()
            .any(|word| tags.contains(word.as_str()) || caption_text.contains(word.as_str()))
    }

    fn overlap<'a>(&'a self, other: &'a KeywordSet) -> Vec<&'a str> {
        self.words.intersection(&other.words).map(String::as_str).collect()
    }
}

/// Keyword classifier; immutable once built
#[derive(Debug, Clone)]
pub struct Classifier {
    organic: KeywordSet,
    inorganic: KeywordSet,
}

impl Classifier {
    /// Build a classifier from two disjoint, non-empty keyword lists
    pub fn new(organic: KeywordSet, inorganic: KeywordSet) -> Result<Self> {
        if organic.is_empty() || inorganic.is_empty() {
            return Err(Error::Config(
                "Keyword lists must not be empty".to_string(),
            ));
        }

        let shared = organic.overlap(&inorganic);
        if !shared.is_empty() {
            return Err(Error::Config(format!(
                "Keywords listed as both organic and inorganic: {}",
                shared.join(", ")
            )));
        }

        Ok(Self { organic, inorganic })
    }

    /// Classifier over the built-in keyword lists
    pub fn with_default_keywords() -> Self {
        Self {
            organic: KeywordSet::new(DEFAULT_ORGANIC_KEYWORDS),
            inorganic: KeywordSet::new(DEFAULT_INORGANIC_KEYWORDS),
        }
    }

    /// Classifier from the `[keywords]` config section; absent lists use the built-ins
    pub fn from_config(section: &KeywordSection) -> Result<Self> {
        let organic = match &section.organic {
            Some(words) => KeywordSet::new(words),
            None => KeywordSet::new(DEFAULT_ORGANIC_KEYWORDS),
        };
        let inorganic = match &section.inorganic {
            Some(words) => KeywordSet::new(words),
            None => KeywordSet::new(DEFAULT_INORGANIC_KEYWORDS),
        };
        Self::new(organic, inorganic)
    }

    pub fn organic_keywords(&self) -> &KeywordSet {
        &self.organic
    }

    pub fn inorganic_keywords(&self) -> &KeywordSet {
        &self.inorganic
    }

    /// Classify lower-cased tags plus lower-cased caption text
    pub fn classify<'a, I>(&self, tags: I, caption_text: &str) -> WasteType
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tags: HashSet<&str> = tags.into_iter().collect();
        let organic = self.organic.matches(&tags, caption_text);
        let inorganic = self.inorganic.matches(&tags, caption_text);
        WasteType::from_flags(organic, inorganic)
    }

    /// Classify a vision service response
    pub fn classify_analysis(&self, analysis: &ImageAnalysis) -> WasteType {
        let tags = analysis.tag_set();
        let caption_text = analysis.caption_text();
        self.classify(tags.iter().map(String::as_str), &caption_text)
    }
}
