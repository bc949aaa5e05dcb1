//! Per-run working state shared by the step builder and output materializer.

use std::path::PathBuf;

/// Accumulators and cursors for one export run.
///
/// Owned by the pipeline and lent mutably to each stage; nothing here
/// outlives the run or is shared across threads.
#[derive(Debug)]
pub struct ExportContext {
    /// Every text fragment seen, in order; joined for metric extraction.
    pub all_text: Vec<String>,
    /// Site-relative path of every image written, in order.
    pub all_images: Vec<String>,
    /// Next image number; increases across the whole run, never per cell.
    pub image_counter: usize,
    /// Title of the most recently opened step.
    pub last_title: Option<String>,
    /// Directory image files are written to.
    pub image_dir: PathBuf,
    /// Prefix for image references, e.g. `/images/1.0`.
    pub image_url_prefix: String,
}

impl ExportContext {
    pub fn new(image_dir: impl Into<PathBuf>, image_url_prefix: impl Into<String>) -> Self {
        Self {
            all_text: Vec::new(),
            all_images: Vec::new(),
            image_counter: 1,
            last_title: None,
            image_dir: image_dir.into(),
            image_url_prefix: image_url_prefix.into(),
        }
    }

    pub fn last_title(&self) -> Option<&str> {
        self.last_title.as_deref()
    }

    /// Record `title` as the current section title.
    pub fn accept_title(&mut self, title: &str) {
        self.last_title = Some(title.to_string());
    }

    /// All accumulated text joined with newlines.
    pub fn joined_text(&self) -> String {
        self.all_text.join("\n")
    }
}
