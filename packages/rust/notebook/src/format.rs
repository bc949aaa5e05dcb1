//! nbformat v4 JSON load/save.

use std::path::Path;

use tracing::debug;

use nbsteps_shared::{NbStepsError, Result};

use crate::model::Notebook;

/// Only major version 4 is understood.
const SUPPORTED_NBFORMAT: u32 = 4;

/// Read a notebook from disk.
pub fn load(path: &Path) -> Result<Notebook> {
    let content = std::fs::read_to_string(path).map_err(|e| NbStepsError::io(path, e))?;
    let notebook = parse_str(&content).map_err(|e| match e {
        NbStepsError::Notebook { message } => {
            NbStepsError::notebook(format!("{}: {message}", path.display()))
        }
        other => other,
    })?;
    debug!(
        path = %path.display(),
        cells = notebook.cells.len(),
        "notebook loaded"
    );
    Ok(notebook)
}

/// Parse a notebook from its JSON text.
pub fn parse_str(json: &str) -> Result<Notebook> {
    let notebook: Notebook = serde_json::from_str(json)
        .map_err(|e| NbStepsError::notebook(format!("invalid notebook JSON: {e}")))?;

    if notebook.nbformat != SUPPORTED_NBFORMAT {
        return Err(NbStepsError::notebook(format!(
            "unsupported nbformat {} (expected {SUPPORTED_NBFORMAT})",
            notebook.nbformat
        )));
    }

    Ok(notebook)
}

/// Serialize a notebook to pretty JSON with a trailing newline.
pub fn to_json(notebook: &Notebook) -> Result<String> {
    let mut json = serde_json::to_string_pretty(notebook)
        .map_err(|e| NbStepsError::Serialization(format!("notebook: {e}")))?;
    json.push('\n');
    Ok(json)
}

/// Write a notebook to disk, overwriting any existing file.
pub fn save(notebook: &Notebook, path: &Path) -> Result<()> {
    let json = to_json(notebook)?;
    std::fs::write(path, json).map_err(|e| NbStepsError::io(path, e))?;
    debug!(path = %path.display(), "notebook saved");
    Ok(())
}
