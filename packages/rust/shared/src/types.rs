//! Output document types consumed by the static site renderer.
//!
//! Field names follow the JSON the site loads from `public/data/`
//! (`model_version`, `type`-tagged blocks, `src`/`alt` for images).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// One renderable unit within a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    /// Source of a code cell.
    Code { language: String, content: String },
    /// Markdown prose (heading already removed when it became the step title).
    Markdown { content: String },
    /// Captured stream output or a plain-text result.
    Stdout { content: String },
    /// A rendered HTML fragment, typically a DataFrame table.
    Html { content: String },
    /// A figure written under `public/images/{version}/`.
    Image { src: String, alt: String },
}

impl Block {
    /// The `type` tag as it appears in the JSON document.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Code { .. } => "code",
            Self::Markdown { .. } => "markdown",
            Self::Stdout { .. } => "stdout",
            Self::Html { .. } => "html",
            Self::Image { .. } => "image",
        }
    }
}

// ---------------------------------------------------------------------------
// Step / StepsDocument
// ---------------------------------------------------------------------------

/// A titled section of the exported document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position in the final document.
    pub index: usize,
    /// Heading text that opened this step.
    pub title: String,
    /// Blocks in arrival order.
    pub blocks: Vec<Block>,
}

impl Step {
    pub fn new(index: usize, title: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            blocks: Vec::new(),
        }
    }
}

/// Root structure for `model-{version}-steps.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepsDocument {
    pub model_version: String,
    pub steps: Vec<Step>,
}

// ---------------------------------------------------------------------------
// Metrics / Manifest
// ---------------------------------------------------------------------------

/// Best-effort metric summary. Keys that were not found are omitted from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logloss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recall: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brier: Option<String>,
}

impl Metrics {
    /// All metric keys, in document order.
    pub const KEYS: [&'static str; 6] = ["auc", "accuracy", "logloss", "precision", "recall", "brier"];

    /// Look up a metric by its JSON key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.slot(key).and_then(|v| v.as_deref())
    }

    /// Set a metric by its JSON key. Unknown keys are ignored.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if let Some(slot) = self.slot_mut(key) {
            *slot = Some(value.into());
        }
    }

    /// Keys that carry a value, in document order.
    pub fn found(&self) -> Vec<&'static str> {
        Self::KEYS
            .into_iter()
            .filter(|k| self.get(k).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.found().is_empty()
    }

    fn slot(&self, key: &str) -> Option<&Option<String>> {
        match key {
            "auc" => Some(&self.auc),
            "accuracy" => Some(&self.accuracy),
            "logloss" => Some(&self.logloss),
            "precision" => Some(&self.precision),
            "recall" => Some(&self.recall),
            "brier" => Some(&self.brier),
            _ => None,
        }
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "auc" => Some(&mut self.auc),
            "accuracy" => Some(&mut self.accuracy),
            "logloss" => Some(&mut self.logloss),
            "precision" => Some(&mut self.precision),
            "recall" => Some(&mut self.recall),
            "brier" => Some(&mut self.brier),
            _ => None,
        }
    }
}

/// Root structure for `model-{version}.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub model_version: String,
    pub metrics: Metrics,
    pub images: Vec<String>,
    pub notes: String,
}
