//! Application configuration for nbsteps.
//!
//! User config lives at `~/.nbsteps/nbsteps.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NbStepsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "nbsteps.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".nbsteps";

// ---------------------------------------------------------------------------
// Config structs (matching nbsteps.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Export defaults.
    #[serde(default)]
    pub export: ExportDefaults,

    /// Notebook execution settings.
    #[serde(default)]
    pub execution: ExecutionConfig,
}

/// `[export]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDefaults {
    /// Root of the site's static assets; data and images land underneath.
    #[serde(default = "default_public_dir")]
    pub public_dir: String,

    /// Code block language when the notebook declares none.
    #[serde(default = "default_language")]
    pub language: String,

    /// Fixed `notes` text written into the manifest.
    #[serde(default = "default_notes")]
    pub notes: String,

    /// Title of the step opened before any heading is seen.
    #[serde(default = "default_placeholder_title")]
    pub placeholder_title: String,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            public_dir: default_public_dir(),
            language: default_language(),
            notes: default_notes(),
            placeholder_title: default_placeholder_title(),
        }
    }
}

fn default_public_dir() -> String {
    "public".into()
}
fn default_language() -> String {
    "python".into()
}
fn default_notes() -> String {
    "Auto-generated from executed notebook".into()
}
fn default_placeholder_title() -> String {
    "Prologue".into()
}

/// `[execution]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Program that runs the notebook (invoked as `<command> nbconvert ...`).
    #[serde(default = "default_command")]
    pub command: String,

    /// Kernel name passed to the execution preprocessor.
    #[serde(default = "default_kernel")]
    pub kernel: String,

    /// Whole-notebook execution timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            kernel: default_kernel(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_command() -> String {
    "jupyter".into()
}
fn default_kernel() -> String {
    "python3".into()
}
fn default_timeout_secs() -> u64 {
    1200
}

// ---------------------------------------------------------------------------
// Export config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime export configuration for a single notebook run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Path to the source notebook.
    pub notebook: PathBuf,
    /// Version string used in every output path.
    pub version: String,
    /// Root of the site's static assets.
    pub public_dir: PathBuf,
    /// Code block language fallback.
    pub language: String,
    /// Manifest `notes` text.
    pub notes: String,
    /// Title of the leading placeholder step.
    pub placeholder_title: String,
    /// Whether to run the notebook before exporting.
    pub execute: bool,
    /// Execution program.
    pub command: String,
    /// Kernel name.
    pub kernel: String,
    /// Execution timeout.
    pub timeout: Duration,
}

impl ExportConfig {
    /// Build a runtime config from the loaded file config.
    pub fn from_app(config: &AppConfig, notebook: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            notebook: notebook.into(),
            version: version.into(),
            public_dir: PathBuf::from(&config.export.public_dir),
            language: config.export.language.clone(),
            notes: config.export.notes.clone(),
            placeholder_title: config.export.placeholder_title.clone(),
            execute: true,
            command: config.execution.command.clone(),
            kernel: config.execution.kernel.clone(),
            timeout: Duration::from_secs(config.execution.timeout_secs),
        }
    }

    /// Reject values that would produce unusable output paths.
    pub fn validate(&self) -> Result<()> {
        let version = self.version.trim();
        if version.is_empty() {
            return Err(NbStepsError::validation("version must not be empty"));
        }
        if version.contains(['/', '\\']) || version == "." || version == ".." {
            return Err(NbStepsError::validation(format!(
                "version '{version}' cannot be used as a path segment"
            )));
        }
        if self.execute && self.timeout.is_zero() {
            return Err(NbStepsError::config("execution timeout must be positive"));
        }
        Ok(())
    }

    /// `public/images/{version}`
    pub fn images_dir(&self) -> PathBuf {
        self.public_dir.join("images").join(&self.version)
    }

    /// `public/data`
    pub fn data_dir(&self) -> PathBuf {
        self.public_dir.join("data")
    }

    /// `public/data/model-{version}.json`
    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir().join(format!("model-{}.json", self.version))
    }

    /// `public/data/model-{version}-steps.json`
    pub fn steps_path(&self) -> PathBuf {
        self.data_dir().join(format!("model-{}-steps.json", self.version))
    }

    /// Site-relative prefix for image references: `/images/{version}`.
    pub fn image_url_prefix(&self) -> String {
        format!("/images/{}", self.version)
    }

    /// Breadcrumb copy of the executed notebook: `{stem}.executed.ipynb`.
    pub fn executed_path(&self) -> PathBuf {
        self.notebook.with_extension("executed.ipynb")
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.nbsteps/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| NbStepsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.nbsteps/nbsteps.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NbStepsError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| NbStepsError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NbStepsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| NbStepsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NbStepsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
