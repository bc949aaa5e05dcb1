//! Shared types, error model, and configuration for nbsteps.
//!
//! This crate is the foundation depended on by all other nbsteps crates.
//! It provides:
//! - [`NbStepsError`], the unified error type
//! - Output document types ([`Block`], [`Step`], [`StepsDocument`], [`Manifest`], [`Metrics`])
//! - Configuration ([`AppConfig`], [`ExportConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ExecutionConfig, ExportConfig, ExportDefaults, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{NbStepsError, Result};
pub use types::{Block, Manifest, Metrics, Step, StepsDocument};
