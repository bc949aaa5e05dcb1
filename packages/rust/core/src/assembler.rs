//! Manifest assembly and output document writing.
//!
//! Folds the finished steps and run accumulators into the two documents the
//! site loads, then writes them (pretty-printed) under `public/data/`.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use nbsteps_shared::{ExportConfig, Manifest, NbStepsError, Result, Step, StepsDocument};

use crate::context::ExportContext;
use crate::metrics::extract_metrics;

/// Both output documents of one run.
#[derive(Debug, Clone)]
pub struct Documents {
    pub manifest: Manifest,
    pub steps: StepsDocument,
}

/// Where the documents were written, with content checksums.
#[derive(Debug, Clone)]
pub struct WrittenDocuments {
    pub manifest_path: PathBuf,
    pub manifest_sha256: String,
    pub steps_path: PathBuf,
    pub steps_sha256: String,
}

/// Build the manifest and steps document for `version`.
pub fn assemble(version: &str, notes: &str, steps: Vec<Step>, ctx: &ExportContext) -> Documents {
    let manifest = Manifest {
        model_version: version.to_string(),
        metrics: extract_metrics(&ctx.joined_text()),
        images: ctx.all_images.clone(),
        notes: notes.to_string(),
    };

    Documents {
        manifest,
        steps: StepsDocument {
            model_version: version.to_string(),
            steps,
        },
    }
}

/// Write both documents to their versioned paths, overwriting earlier runs.
#[instrument(skip_all, fields(version = %config.version))]
pub fn write_documents(config: &ExportConfig, docs: &Documents) -> Result<WrittenDocuments> {
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir).map_err(|e| NbStepsError::io(&data_dir, e))?;

    let manifest_path = config.manifest_path();
    let manifest_sha256 = write_json(&manifest_path, &docs.manifest)?;

    let steps_path = config.steps_path();
    let steps_sha256 = write_json(&steps_path, &docs.steps)?;

    info!(
        manifest = %manifest_path.display(),
        steps = %steps_path.display(),
        "documents written"
    );

    Ok(WrittenDocuments {
        manifest_path,
        manifest_sha256,
        steps_path,
        steps_sha256,
    })
}

/// Write a JSON file (pretty-printed) and return the SHA-256 of its bytes.
fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<String> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| NbStepsError::Serialization(format!("{}: {e}", path.display())))?;
    std::fs::write(path, &json).map_err(|e| NbStepsError::io(path, e))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    debug!(path = %path.display(), size = json.len(), "wrote JSON file");
    Ok(hash)
}
