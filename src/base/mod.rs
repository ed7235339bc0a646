//! Foundation types for the analysis core.
//!
//! This module provides the primitives used throughout the crate:
//! - [`Span`] - half-open character-offset ranges
//! - [`SourceBuffer`] - immutable text with a derived line-start index
//! - [`AnalysisError`], [`ParseError`] - the error taxonomy
//!
//! This module has NO dependencies on other pysemantic modules.
//!
//! All offsets in this crate are **character** offsets (not bytes), and
//! line numbers are 1-based, matching the conventions editors hand us.

mod buffer;
mod error;
mod span;

pub use buffer::SourceBuffer;
pub use error::{AnalysisError, ParseError, ParseErrorKind};
pub use span::Span;
