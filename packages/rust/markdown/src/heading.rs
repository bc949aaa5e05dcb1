use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::html;

/// Rendered labels longer than this are content, not headings.
const MAX_PLAIN_HEADING_CHARS: usize = 80;

/// `#`, `##` or `###` heading on the first line, up to 3 leading spaces.
static MD_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A {0,3}#{1,3}[ \t]+([^\r\n]*)").expect("valid regex")
});

/// Closing `#` run of an ATX heading (`## Title ##`).
static MD_CLOSING_HASHES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+#+\s*$").expect("valid regex"));

/// `<h1>..</h1>` or `<h2>..</h2>`, same level on both ends, shortest body.
static H_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>|<h2[^>]*>(.*?)</h2>").expect("valid regex")
});

/// Where a fragment came from; decides which heading forms are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Raw markdown cell source.
    MarkdownSource,
    /// `text/html` payload of a rich output.
    RenderedHtml,
    /// Stream text or a `text/plain` payload.
    PlainPrintedText,
}

/// A detected heading and the fragment with that heading removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub title: String,
    pub remainder: String,
}

/// Detect a section heading in `fragment`.
///
/// Returns `None` when the fragment does not announce a section; callers then
/// treat the whole fragment as content. Titles are never empty.
pub fn detect(fragment: &str, kind: SourceKind) -> Option<Heading> {
    let heading = match kind {
        SourceKind::MarkdownSource => markdown_heading(fragment).or_else(|| tag_heading(fragment)),
        SourceKind::RenderedHtml => match H_TAG_RE.captures(fragment) {
            // An explicit tag decides on its own, even when its text is blank.
            Some(_) => tag_heading(fragment),
            None => plain_html_heading(fragment),
        },
        SourceKind::PlainPrintedText => tag_heading(fragment),
    };

    if let Some(h) = &heading {
        trace!(?kind, title = %h.title, "heading detected");
    }
    heading
}

/// Whether `title` repeats the most recently accepted title.
pub fn is_same_title(title: &str, last: Option<&str>) -> bool {
    last.is_some_and(|last| last.trim() == title.trim())
}

fn markdown_heading(fragment: &str) -> Option<Heading> {
    let caps = MD_HEADING_RE.captures(fragment)?;
    let raw = caps.get(1).map_or("", |m| m.as_str()).trim();
    let title = MD_CLOSING_HASHES_RE.replace(raw, "").trim().to_string();
    if title.is_empty() {
        return None;
    }

    let end = caps.get(0).map_or(0, |m| m.end());
    Some(Heading {
        title,
        remainder: fragment[end..].trim_start().to_string(),
    })
}

fn tag_heading(fragment: &str) -> Option<Heading> {
    let caps = H_TAG_RE.captures(fragment)?;
    let inner = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
    let title = html::plain_text(inner);
    if title.is_empty() {
        return None;
    }

    let whole = caps.get(0)?;
    let mut remainder = String::with_capacity(fragment.len());
    remainder.push_str(&fragment[..whole.start()]);
    remainder.push_str(&fragment[whole.end()..]);

    Some(Heading {
        title,
        remainder: remainder.trim_start().to_string(),
    })
}

/// A short, structure-free rendered fragment is treated as a label.
fn plain_html_heading(fragment: &str) -> Option<Heading> {
    if html::has_heavy_tags(fragment) {
        return None;
    }
    let title = html::plain_text(fragment);
    if title.is_empty() || title.chars().count() > MAX_PLAIN_HEADING_CHARS {
        return None;
    }
    Some(Heading {
        title,
        remainder: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title_of(fragment: &str, kind: SourceKind) -> Option<String> {
        detect(fragment, kind).map(|h| h.title)
    }

    // --- markdown source ---

    #[test]
    fn markdown_levels_one_to_three() {
        for prefix in ["#", "##", "###"] {
            let h = detect(&format!("{prefix} Title\nBody text"), SourceKind::MarkdownSource)
                .expect("heading");
            assert_eq!(h.title, "Title");
            assert_eq!(h.remainder, "Body text");
        }
        assert_eq!(title_of("#### Too deep", SourceKind::MarkdownSource), None);
    }

    #[test]
    fn markdown_allows_three_leading_spaces() {
        assert_eq!(
            title_of("   ## Indented", SourceKind::MarkdownSource).as_deref(),
            Some("Indented")
        );
        assert_eq!(title_of("    # Code block", SourceKind::MarkdownSource), None);
        // A leading tab is indented code, not heading indentation.
        assert_eq!(title_of("\t# Tabbed", SourceKind::MarkdownSource), None);
    }

    #[test]
    fn markdown_heading_must_open_the_fragment() {
        assert_eq!(title_of("Intro text\n# Later", SourceKind::MarkdownSource), None);
    }

    #[test]
    fn markdown_strips_closing_hashes() {
        assert_eq!(
            title_of("## Results ##", SourceKind::MarkdownSource).as_deref(),
            Some("Results")
        );
        assert_eq!(
            title_of("# Using C#", SourceKind::MarkdownSource).as_deref(),
            Some("Using C#")
        );
    }

    #[test]
    fn markdown_requires_space_and_text() {
        assert_eq!(title_of("#hashtag", SourceKind::MarkdownSource), None);
        assert_eq!(title_of("#   \nbody", SourceKind::MarkdownSource), None);
    }

    #[test]
    fn markdown_heading_only_has_empty_remainder() {
        let h = detect("# Intro\n\n", SourceKind::MarkdownSource).expect("heading");
        assert_eq!(h.remainder, "");
    }

    #[test]
    fn markdown_falls_back_to_html_tags() {
        let h = detect(
            "Some intro\n<h2 style=\"color:red\">Load   <em>Data</em></h2>\nMore",
            SourceKind::MarkdownSource,
        )
        .expect("heading");
        assert_eq!(h.title, "Load Data");
        assert_eq!(h.remainder, "Some intro\n\nMore");
    }

    #[test]
    fn markdown_removes_only_first_tag_pair() {
        let h = detect("<h1>One</h1>\n<h1>Two</h1>", SourceKind::MarkdownSource).expect("heading");
        assert_eq!(h.title, "One");
        assert_eq!(h.remainder, "<h1>Two</h1>");
    }

    #[test]
    fn markdown_without_heading_is_none() {
        assert_eq!(title_of("Just prose.", SourceKind::MarkdownSource), None);
        // Short prose is not a heading for markdown sources.
        assert_eq!(title_of("Short", SourceKind::MarkdownSource), None);
    }

    // --- html tags ---

    #[test]
    fn html_tags_are_case_insensitive_and_multiline() {
        assert_eq!(
            title_of("<H1>\n  Feature\n  Engineering\n</H1>", SourceKind::RenderedHtml).as_deref(),
            Some("Feature Engineering")
        );
    }

    #[test]
    fn html_tag_levels_must_match() {
        // `<h1>` closed by `</h2>` is not a pair; the later `<h2>` pair is.
        assert_eq!(
            title_of("<h1>Broken</h2><h2>Fine</h2>", SourceKind::PlainPrintedText).as_deref(),
            Some("Fine")
        );
        assert_eq!(title_of("<h3>Three</h3>", SourceKind::PlainPrintedText), None);
    }

    // --- rendered html ---

    #[test]
    fn rendered_short_label_is_heading() {
        let h = detect("<div><b>Model Evaluation</b></div>", SourceKind::RenderedHtml)
            .expect("heading");
        assert_eq!(h.title, "Model Evaluation");
        assert_eq!(h.remainder, "");
    }

    #[test]
    fn rendered_table_is_never_a_plain_heading() {
        let table = r#"<table class="dataframe"><tr><td>1</td></tr></table>"#;
        assert_eq!(title_of(table, SourceKind::RenderedHtml), None);
    }

    #[test]
    fn rendered_table_with_explicit_heading_uses_tag() {
        let html = "<h2>Summary</h2><table><tr><td>1</td></tr></table>";
        assert_eq!(title_of(html, SourceKind::RenderedHtml).as_deref(), Some("Summary"));
    }

    #[test]
    fn rendered_long_text_is_not_heading() {
        let long = format!("<p>{}</p>", "word ".repeat(30));
        assert_eq!(title_of(&long, SourceKind::RenderedHtml), None);

        let exactly_80 = format!("<span>{}</span>", "a".repeat(80));
        assert!(title_of(&exactly_80, SourceKind::RenderedHtml).is_some());
    }

    #[test]
    fn rendered_blank_is_not_heading() {
        assert_eq!(title_of("<div>  </div>", SourceKind::RenderedHtml), None);
        assert_eq!(title_of("<h2> </h2>Text", SourceKind::RenderedHtml), None);
    }

    // --- plain printed text ---

    #[test]
    fn printed_text_needs_literal_tags() {
        assert_eq!(
            title_of("<h2>Training</h2>\n", SourceKind::PlainPrintedText).as_deref(),
            Some("Training")
        );
        assert_eq!(title_of("Training\n", SourceKind::PlainPrintedText), None);
        assert_eq!(title_of("# Training\n", SourceKind::PlainPrintedText), None);
    }

    #[test]
    fn same_title_compares_trimmed() {
        assert!(is_same_title("Intro", Some(" Intro ")));
        assert!(!is_same_title("Intro", Some("Outro")));
        assert!(!is_same_title("Intro", None));
    }
}
