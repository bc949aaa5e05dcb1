//! Small regex-based HTML text helpers.
//!
//! These operate on fragments, not documents: no parsing, no entity decoding.

use std::sync::LazyLock;

use regex::Regex;

/// Any tag, opening or closing.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Structural tags that mark a fragment as content rather than a label.
static HEAVY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(table|tr|td|th|thead|tbody|tfoot|svg|img|pre|code|style|script)\b")
        .expect("valid regex")
});

/// Remove every tag, keeping inner text, and trim the result.
pub fn strip_tags(fragment: &str) -> String {
    TAG_RE.replace_all(fragment, "").trim().to_string()
}

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tag-stripped, whitespace-collapsed text of a fragment.
pub fn plain_text(fragment: &str) -> String {
    collapse_whitespace(&strip_tags(fragment))
}

/// Whether the fragment contains tables, figures, code, or scripts.
pub fn has_heavy_tags(fragment: &str) -> bool {
    HEAVY_TAG_RE.is_match(fragment)
}

/// Whether rendered HTML is a table (pandas wraps frames in `<table class="dataframe">`).
pub fn is_table(fragment: &str) -> bool {
    fragment.contains("<table") || fragment.contains(r#"class="dataframe""#)
}
