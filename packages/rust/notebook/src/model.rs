//! In-memory nbformat v4 document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// MultilineString
// ---------------------------------------------------------------------------

/// nbformat stores text either as one string or as a list of line fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultilineString {
    Single(String),
    Lines(Vec<String>),
}

impl MultilineString {
    /// The full text, with list fragments concatenated as-is.
    pub fn text(&self) -> String {
        match self {
            Self::Single(s) => s.clone(),
            Self::Lines(lines) => lines.concat(),
        }
    }
}

impl Default for MultilineString {
    fn default() -> Self {
        Self::Single(String::new())
    }
}

impl From<&str> for MultilineString {
    fn from(s: &str) -> Self {
        Self::Single(s.to_string())
    }
}

impl From<String> for MultilineString {
    fn from(s: String) -> Self {
        Self::Single(s)
    }
}

// ---------------------------------------------------------------------------
// Notebook
// ---------------------------------------------------------------------------

/// A whole notebook document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub nbformat: u32,
    pub nbformat_minor: u32,
}

impl Notebook {
    /// An empty v4.5 notebook with the given cells.
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            metadata: Map::new(),
            nbformat: 4,
            nbformat_minor: 5,
        }
    }

    /// Declared kernel language (`kernelspec.language`, then `language_info.name`).
    pub fn language(&self) -> Option<&str> {
        let from_kernelspec = self
            .metadata
            .get("kernelspec")
            .and_then(|k| k.get("language"))
            .and_then(Value::as_str);

        from_kernelspec
            .or_else(|| {
                self.metadata
                    .get("language_info")
                    .and_then(|l| l.get("name"))
                    .and_then(Value::as_str)
            })
            .filter(|lang| !lang.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Markdown(MarkdownCell),
    Code(CodeCell),
    Raw(RawCell),
}

impl Cell {
    /// Convenience constructor used heavily in tests.
    pub fn markdown(source: &str) -> Self {
        Self::Markdown(MarkdownCell {
            source: source.into(),
            extra: Map::new(),
        })
    }

    /// Convenience constructor used heavily in tests.
    pub fn code(source: &str, outputs: Vec<Output>, execution_count: Option<u64>) -> Self {
        Self::Code(CodeCell {
            source: source.into(),
            outputs,
            execution_count,
            extra: Map::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkdownCell {
    #[serde(default)]
    pub source: MultilineString,
    /// `id`, `metadata`, `attachments`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeCell {
    #[serde(default)]
    pub source: MultilineString,
    #[serde(default)]
    pub outputs: Vec<Output>,
    #[serde(default)]
    pub execution_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCell {
    #[serde(default)]
    pub source: MultilineString,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    Stream(StreamOutput),
    DisplayData(DisplayOutput),
    ExecuteResult(DisplayOutput),
    Error(ErrorOutput),
}

impl Output {
    pub fn stream(text: &str) -> Self {
        Self::Stream(StreamOutput {
            name: "stdout".into(),
            text: text.into(),
            extra: Map::new(),
        })
    }

    /// A `display_data` output from `(mime, text)` pairs.
    pub fn display(payloads: &[(&str, &str)]) -> Self {
        Self::DisplayData(DisplayOutput {
            data: MimeBundle::from_pairs(payloads),
            extra: Map::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamOutput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: MultilineString,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shared shape of `display_data` and `execute_result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayOutput {
    #[serde(default)]
    pub data: MimeBundle,
    /// `metadata`, and `execution_count` for execute results.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorOutput {
    #[serde(default)]
    pub ename: String,
    #[serde(default)]
    pub evalue: String,
    #[serde(default)]
    pub traceback: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// MimeBundle
// ---------------------------------------------------------------------------

/// Mime-type keyed payloads of a rich output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MimeBundle(pub Map<String, Value>);

impl MimeBundle {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(mime, text)| ((*mime).to_string(), Value::String((*text).to_string())))
                .collect(),
        )
    }

    /// Textual payload for `mime`, joining list-of-lines payloads.
    /// Returns `None` for absent or non-textual (JSON object) payloads.
    pub fn text(&self, mime: &str) -> Option<String> {
        match self.0.get(mime)? {
            Value::String(s) => Some(s.clone()),
            Value::Array(parts) => Some(parts.iter().filter_map(Value::as_str).collect()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiline_string_joins_lines() {
        let lines = MultilineString::Lines(vec!["# Title\n".into(), "Body".into()]);
        assert_eq!(lines.text(), "# Title\nBody");
        assert_eq!(MultilineString::Lines(vec![]).text(), "");
    }

    #[test]
    fn language_prefers_kernelspec() {
        let mut nb = Notebook::new(vec![]);
        assert_eq!(nb.language(), None);

        nb.metadata.insert(
            "language_info".into(),
            serde_json::json!({ "name": "julia" }),
        );
        assert_eq!(nb.language(), Some("julia"));

        nb.metadata.insert(
            "kernelspec".into(),
            serde_json::json!({ "language": "python", "name": "python3" }),
        );
        assert_eq!(nb.language(), Some("python"));
    }

    #[test]
    fn mime_bundle_text_handles_lists_and_objects() {
        let bundle = MimeBundle(
            serde_json::json!({
                "text/html": ["<table>", "</table>"],
                "text/plain": "df",
                "application/json": { "a": 1 }
            })
            .as_object()
            .cloned()
            .expect("object"),
        );
        assert_eq!(bundle.text("text/html").as_deref(), Some("<table></table>"));
        assert_eq!(bundle.text("text/plain").as_deref(), Some("df"));
        assert_eq!(bundle.text("application/json"), None);
        assert_eq!(bundle.text("image/png"), None);
    }
}
