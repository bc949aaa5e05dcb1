//! Export pipeline and domain logic for nbsteps.
//!
//! This crate turns an executed notebook into the steps document and metrics
//! manifest the static site renders (e.g., `export_notebook`).

pub mod assembler;
pub mod builder;
pub mod context;
pub mod materializer;
pub mod metrics;
pub mod pipeline;

pub use builder::{StepBuilder, build_steps};
pub use context::ExportContext;
pub use materializer::{Directive, materialize};
pub use metrics::extract_metrics;
pub use pipeline::{ExportResult, ProgressReporter, SilentProgress, export_notebook};
