//! End-to-end export: notebook → execute → steps → manifest → `public/`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument};

use nbsteps_notebook::{self as notebook, NotebookExecutor};
use nbsteps_shared::{ExportConfig, NbStepsError, Result};

use crate::assembler::{self, WrittenDocuments};
use crate::builder::StepBuilder;
use crate::context::ExportContext;

/// Result of a successful export.
#[derive(Debug)]
pub struct ExportResult {
    /// Number of steps in the steps document.
    pub step_count: usize,
    /// Number of image files written.
    pub image_count: usize,
    /// Metric keys that were found.
    pub metrics_found: Vec<&'static str>,
    /// Written documents and their checksums.
    pub documents: WrittenDocuments,
    /// Breadcrumb copy of the executed notebook, when execution ran.
    pub executed_path: Option<PathBuf>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting export status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each cell has been routed into the step list.
    fn cell_processed(&self, current: usize, total: usize);
    /// Called when the export completes.
    fn done(&self, result: &ExportResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn cell_processed(&self, _current: usize, _total: usize) {}
    fn done(&self, _result: &ExportResult) {}
}

/// Run the full export.
///
/// 1. Load the notebook
/// 2. Execute it (when enabled) and write the `.executed.ipynb` breadcrumb
/// 3. Walk the cells into steps, writing images as they are found
/// 4. Assemble and write the manifest and steps documents
///
/// Any failure aborts the run; files already written are left in place and
/// are overwritten by the next run.
#[instrument(skip_all, fields(notebook = %config.notebook.display(), version = %config.version))]
pub async fn export_notebook<E: NotebookExecutor>(
    config: &ExportConfig,
    executor: &E,
    progress: &dyn ProgressReporter,
) -> Result<ExportResult> {
    let start = Instant::now();

    config.validate()?;
    if !config.notebook.is_file() {
        return Err(NbStepsError::validation(format!(
            "notebook not found: {}",
            config.notebook.display()
        )));
    }

    info!("starting export");

    // --- Phase 1: Load ---
    progress.phase("Reading notebook");
    let mut nb = notebook::load(&config.notebook)?;

    // --- Phase 2: Execute ---
    let mut executed_path = None;
    if config.execute {
        progress.phase("Executing notebook");
        let working_dir = working_dir(&config.notebook)?;
        nb = executor.execute(&nb, &working_dir, config.timeout).await?;

        let breadcrumb = config.executed_path();
        notebook::save(&nb, &breadcrumb)?;
        info!(path = %breadcrumb.display(), "executed copy saved");
        executed_path = Some(breadcrumb);
    } else {
        info!("execution disabled, exporting stored outputs");
    }

    // --- Phase 3: Build steps ---
    progress.phase("Building steps");
    let image_dir = config.images_dir();
    std::fs::create_dir_all(&image_dir).map_err(|e| NbStepsError::io(&image_dir, e))?;

    let language = nb.language().unwrap_or(config.language.as_str()).to_string();
    let mut ctx = ExportContext::new(&image_dir, config.image_url_prefix());
    let mut builder = StepBuilder::new(language, config.placeholder_title.as_str());

    let total = nb.cells.len();
    for (i, cell) in nb.cells.iter().enumerate() {
        builder.push_cell(cell, &mut ctx)?;
        progress.cell_processed(i + 1, total);
    }
    let steps = builder.finish();

    // --- Phase 4: Assemble ---
    progress.phase("Writing documents");
    let step_count = steps.len();
    let docs = assembler::assemble(&config.version, &config.notes, steps, &ctx);
    let metrics_found = docs.manifest.metrics.found();
    let documents = assembler::write_documents(config, &docs)?;

    let result = ExportResult {
        step_count,
        image_count: ctx.all_images.len(),
        metrics_found,
        documents,
        executed_path,
        elapsed: start.elapsed(),
    };

    info!(
        steps = result.step_count,
        images = result.image_count,
        metrics = ?result.metrics_found,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "export complete"
    );

    progress.done(&result);
    Ok(result)
}

/// The notebook's parent directory, resolved, used as the kernel's cwd.
fn working_dir(notebook_path: &Path) -> Result<PathBuf> {
    let parent = match notebook_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::canonicalize(parent).map_err(|e| NbStepsError::io(parent, e))
}
