//! Heading detection over markdown sources, rendered HTML, and printed text.
//!
//! A notebook announces its sections in several ways: markdown `#` lines,
//! literal `<h1>`/`<h2>` tags in markdown or in printed strings, and short
//! rendered HTML labels. [`detect`] folds all of them into one
//! `{title, remainder}` result so callers never special-case the source.

mod heading;
pub mod html;

pub use heading::{Heading, SourceKind, detect, is_same_title};
