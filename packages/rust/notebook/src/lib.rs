//! Notebook document model, nbformat v4 load/save, and the execution collaborator.
//!
//! The export pipeline only reads cells and outputs; everything it does not
//! understand is carried through untouched so the executed breadcrumb copy
//! stays a valid notebook.

pub mod executor;
pub mod format;
pub mod model;

pub use executor::{JupyterExecutor, NotebookExecutor, PassthroughExecutor};
pub use format::{load, parse_str, save, to_json};
pub use model::{
    Cell, CodeCell, DisplayOutput, ErrorOutput, MarkdownCell, MimeBundle, MultilineString,
    Notebook, Output, RawCell, StreamOutput,
};
