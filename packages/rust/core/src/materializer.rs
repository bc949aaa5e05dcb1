//! Output classification: turns one cell output into blocks or a new-step signal.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

use nbsteps_markdown::{SourceKind, detect, html, is_same_title};
use nbsteps_notebook::{MimeBundle, Output};
use nbsteps_shared::{Block, NbStepsError, Result};

use crate::context::ExportContext;

const MIME_HTML: &str = "text/html";
const MIME_PNG: &str = "image/png";
const MIME_SVG: &str = "image/svg+xml";
const MIME_PLAIN: &str = "text/plain";

/// What the step builder should do with a piece of output, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Append this block to the current step.
    Emit(Block),
    /// The output was a heading: open a new step with this title.
    /// The heading content itself is not emitted.
    OpenStep(String),
}

/// Classify one output of a code cell.
///
/// Writes image files and updates the run accumulators as a side effect.
/// When an output yields [`Directive::OpenStep`], `ctx.last_title` is
/// already updated so later payloads of the same output compare against it.
pub fn materialize(
    output: &Output,
    execution_count: Option<u64>,
    ctx: &mut ExportContext,
) -> Result<Vec<Directive>> {
    match output {
        Output::Stream(stream) => Ok(materialize_stream(&stream.text.text(), ctx)),
        Output::DisplayData(rich) | Output::ExecuteResult(rich) => {
            materialize_rich(&rich.data, execution_count, ctx)
        }
        Output::Error(err) => {
            debug!(ename = %err.ename, "skipping error output");
            Ok(Vec::new())
        }
    }
}

fn materialize_stream(text: &str, ctx: &mut ExportContext) -> Vec<Directive> {
    if text.is_empty() {
        return Vec::new();
    }
    if let Some(title) = new_title(text, SourceKind::PlainPrintedText, ctx) {
        return vec![Directive::OpenStep(title)];
    }
    ctx.all_text.push(text.to_string());
    vec![Directive::Emit(Block::Stdout {
        content: text.to_string(),
    })]
}

fn materialize_rich(
    data: &MimeBundle,
    execution_count: Option<u64>,
    ctx: &mut ExportContext,
) -> Result<Vec<Directive>> {
    let mut directives = Vec::new();
    let mut saw_html_table = false;

    if let Some(markup) = data.text(MIME_HTML) {
        saw_html_table = html::is_table(&markup);
        if let Some(title) = new_title(&markup, SourceKind::RenderedHtml, ctx) {
            directives.push(Directive::OpenStep(title));
        } else if !markup.is_empty() {
            ctx.all_text.push(html::strip_tags(&markup));
            directives.push(Directive::Emit(Block::Html { content: markup }));
        }
    }

    if let Some(encoded) = data.text(MIME_PNG) {
        let compact: String = encoded.split_whitespace().collect();
        match STANDARD.decode(compact.as_bytes()) {
            Ok(bytes) => {
                let block = write_image(ctx, execution_count, "png", &bytes)?;
                directives.push(Directive::Emit(block));
            }
            Err(e) => warn!(error = %e, "skipping undecodable image/png payload"),
        }
    }

    if let Some(svg) = data.text(MIME_SVG) {
        let block = write_image(ctx, execution_count, "svg", svg.as_bytes())?;
        directives.push(Directive::Emit(block));
    }

    if let Some(text) = data.text(MIME_PLAIN) {
        if let Some(title) = new_title(&text, SourceKind::PlainPrintedText, ctx) {
            directives.push(Directive::OpenStep(title));
        } else if !saw_html_table {
            ctx.all_text.push(text.clone());
            directives.push(Directive::Emit(Block::Stdout { content: text }));
        }
    }

    Ok(directives)
}

/// A detected heading title that differs from the last accepted one.
fn new_title(fragment: &str, kind: SourceKind, ctx: &mut ExportContext) -> Option<String> {
    let heading = detect(fragment, kind)?;
    if is_same_title(&heading.title, ctx.last_title()) {
        return None;
    }
    ctx.accept_title(&heading.title);
    Some(heading.title)
}

fn write_image(
    ctx: &mut ExportContext,
    execution_count: Option<u64>,
    extension: &str,
    bytes: &[u8],
) -> Result<Block> {
    let name = format!(
        "cell_{}_img_{:02}.{extension}",
        execution_count.unwrap_or(0),
        ctx.image_counter
    );
    let path = ctx.image_dir.join(&name);
    write_file(&path, bytes)?;

    let src = format!("{}/{name}", ctx.image_url_prefix);
    ctx.all_images.push(src.clone());
    ctx.image_counter += 1;

    debug!(path = %path.display(), size = bytes.len(), "wrote image");
    Ok(Block::Image { src, alt: name })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|e| NbStepsError::io(path, e))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    /// 1x1 transparent PNG.
    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

    fn temp_ctx() -> (ExportContext, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "nbsteps-materializer-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        (ExportContext::new(&dir, "/images/1.0"), dir)
    }

    fn emitted(directives: &[Directive]) -> Vec<&Block> {
        directives
            .iter()
            .filter_map(|d| match d {
                Directive::Emit(b) => Some(b),
                Directive::OpenStep(_) => None,
            })
            .collect()
    }

    #[test]
    fn stream_becomes_stdout_and_text() {
        let (mut ctx, dir) = temp_ctx();
        let out = materialize(&Output::stream("Accuracy: 0.87\n"), Some(1), &mut ctx).unwrap();
        assert_eq!(
            out,
            vec![Directive::Emit(Block::Stdout {
                content: "Accuracy: 0.87\n".into()
            })]
        );
        assert_eq!(ctx.all_text, vec!["Accuracy: 0.87\n".to_string()]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn printed_heading_opens_step_and_is_suppressed() {
        let (mut ctx, dir) = temp_ctx();
        let out = materialize(&Output::stream("<h2>Training</h2>\n"), Some(1), &mut ctx).unwrap();
        assert_eq!(out, vec![Directive::OpenStep("Training".into())]);
        assert!(ctx.all_text.is_empty());
        assert_eq!(ctx.last_title(), Some("Training"));

        // Printing the same heading again is ordinary output.
        let again = materialize(&Output::stream("<h2>Training</h2>\n"), Some(2), &mut ctx).unwrap();
        assert_eq!(emitted(&again).len(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_stream_is_skipped() {
        let (mut ctx, dir) = temp_ctx();
        assert!(materialize(&Output::stream(""), None, &mut ctx).unwrap().is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn html_table_suppresses_plain_repr() {
        let (mut ctx, dir) = temp_ctx();
        let output = Output::display(&[
            ("text/html", r#"<table class="dataframe"><tr><td>0.5</td></tr></table>"#),
            ("text/plain", "   a\n0  0.5"),
        ]);
        let out = materialize(&output, Some(4), &mut ctx).unwrap();
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], Directive::Emit(Block::Html { content }) if content.contains("dataframe")));
        assert_eq!(ctx.all_text, vec!["0.5".to_string()]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rendered_label_opens_step() {
        let (mut ctx, dir) = temp_ctx();
        let output = Output::display(&[
            ("text/html", "<b>Model Evaluation</b>"),
            ("text/plain", "<IPython.core.display.HTML object>"),
        ]);
        let out = materialize(&output, Some(5), &mut ctx).unwrap();
        assert_eq!(out[0], Directive::OpenStep("Model Evaluation".into()));
        // No table was seen, so the plain repr still lands in the new step.
        assert!(matches!(&out[1], Directive::Emit(Block::Stdout { .. })));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn repeated_rendered_label_is_emitted_as_html() {
        let (mut ctx, dir) = temp_ctx();
        ctx.accept_title("Model Evaluation");
        let output = Output::display(&[("text/html", "<b>Model Evaluation</b>")]);

        let out = materialize(&output, Some(6), &mut ctx).unwrap();

        assert_eq!(
            out,
            vec![Directive::Emit(Block::Html {
                content: "<b>Model Evaluation</b>".into()
            })]
        );
        assert_eq!(ctx.all_text, vec!["Model Evaluation".to_string()]);
        assert_eq!(ctx.last_title(), Some("Model Evaluation"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn png_and_svg_are_written_with_run_wide_counter() {
        let (mut ctx, dir) = temp_ctx();
        let png = Output::display(&[("image/png", PNG_B64), ("text/plain", "<Figure size 640x480>")]);
        let svg = Output::display(&[("image/svg+xml", "<svg xmlns=\"http://www.w3.org/2000/svg\"/>")]);

        let first = materialize(&png, Some(7), &mut ctx).unwrap();
        let second = materialize(&svg, None, &mut ctx).unwrap();

        assert_eq!(
            first[0],
            Directive::Emit(Block::Image {
                src: "/images/1.0/cell_7_img_01.png".into(),
                alt: "cell_7_img_01.png".into(),
            })
        );
        assert!(matches!(&first[1], Directive::Emit(Block::Stdout { .. })));
        assert_eq!(
            second,
            vec![Directive::Emit(Block::Image {
                src: "/images/1.0/cell_0_img_02.svg".into(),
                alt: "cell_0_img_02.svg".into(),
            })]
        );

        assert!(dir.join("cell_7_img_01.png").exists());
        let svg_text = std::fs::read_to_string(dir.join("cell_0_img_02.svg")).unwrap();
        assert!(svg_text.starts_with("<svg"));
        assert_eq!(ctx.all_images.len(), 2);
        assert_eq!(ctx.image_counter, 3);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn wrapped_base64_is_accepted() {
        let (mut ctx, dir) = temp_ctx();
        let wrapped = format!("{}\n{}", &PNG_B64[..40], &PNG_B64[40..]);
        let out = materialize(&Output::display(&[("image/png", wrapped.as_str())]), Some(1), &mut ctx).unwrap();
        assert_eq!(emitted(&out).len(), 1);
        let bytes = std::fs::read(dir.join("cell_1_img_01.png")).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn bad_base64_is_skipped_without_advancing_counter() {
        let (mut ctx, dir) = temp_ctx();
        let out = materialize(&Output::display(&[("image/png", "not base64!!")]), Some(1), &mut ctx)
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(ctx.image_counter, 1);
        assert!(ctx.all_images.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_mime_is_silent() {
        let (mut ctx, dir) = temp_ctx();
        let json_only = Output::display(&[("application/vnd.custom+json", "{}")]);
        assert!(materialize(&json_only, Some(1), &mut ctx).unwrap().is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
