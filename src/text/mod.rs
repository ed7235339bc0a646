//! Lexical-level text analysis: offset-based word scanning, a
//! line-oriented tokenizer, and logical-line segmentation.
//!
//! Everything here works on character offsets into a [`SourceBuffer`]
//! and never consults semantic information; the `semantic` layer builds
//! on these primitives.
//!
//! [`SourceBuffer`]: crate::base::SourceBuffer

// ============================================================================
// Submodules
// ============================================================================

pub mod logical;
pub mod tokens;
pub mod worder;

// ============================================================================
// Re-exports
// ============================================================================

pub use logical::{CachedLogicalLines, LogicalLineFinder, block_start};
pub use tokens::{TokKind, Token, Tokenized, count_line_indents, tokenize, tokenize_lines};
pub use worder::Worder;
