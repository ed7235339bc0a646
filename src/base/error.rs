//! Error taxonomy for the analysis core.
//!
//! Two layers, mirroring how failures propagate:
//! - [`ParseError`] - lexical/structural failures inside tokenization and
//!   logical-line grouping. Recovered at the component boundary where
//!   possible (the segmenter retries structural errors up to a fixed
//!   budget before giving up).
//! - [`AnalysisError`] - the only errors that cross the crate boundary:
//!   a caller-supplied bad module reference, or a syntax error when the
//!   caller asked for strict parsing.
//!
//! Unresolved identifiers are *not* errors: resolution returns `None`
//! and callers must treat that as an expected outcome.

use thiserror::Error;

/// What went wrong while tokenizing or grouping logical lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A string literal ran to the end of the buffer without its
    /// closing quote.
    UnterminatedString,
    /// A closing bracket with no matching opener, or vice versa.
    UnmatchedBracket,
    /// A dedent that matches no enclosing indentation level. This is
    /// the retriable structural error: the segmenter recomputes its
    /// block start and tries again before propagating it.
    InconsistentIndentation,
    /// A statement header the parser could not make sense of.
    MalformedStatement,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnterminatedString => "unterminated string",
            Self::UnmatchedBracket => "unmatched bracket",
            Self::InconsistentIndentation => "inconsistent indentation",
            Self::MalformedStatement => "malformed statement",
        }
    }
}

/// A lexical or structural error carrying the 1-based line it was
/// detected on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} at line {line}", kind = kind.as_str())]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize) -> Self {
        Self { kind, line }
    }

    /// Whether the segmenter may retry from a recomputed block start.
    pub fn is_retriable(&self) -> bool {
        self.kind == ParseErrorKind::InconsistentIndentation
    }
}

/// Errors reported across the crate boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// The requested module does not exist. Fatal to the request: it
    /// indicates a caller-supplied bad reference, not an analysis
    /// limitation.
    #[error("module `{name}` not found")]
    ModuleNotFound { name: String },

    /// The module text failed to parse. Only surfaced when the caller
    /// requested strict parsing; tolerant mode caches a degraded module
    /// instead.
    #[error("syntax error at line {line}: {message}")]
    ModuleSyntax { line: usize, message: String },
}

impl From<ParseError> for AnalysisError {
    fn from(err: ParseError) -> Self {
        AnalysisError::ModuleSyntax {
            line: err.line,
            message: err.kind.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_indentation_errors_are_retriable() {
        assert!(ParseError::new(ParseErrorKind::InconsistentIndentation, 3).is_retriable());
        assert!(!ParseError::new(ParseErrorKind::UnterminatedString, 3).is_retriable());
    }

    #[test]
    fn test_parse_error_converts_to_module_syntax() {
        let err: AnalysisError = ParseError::new(ParseErrorKind::UnmatchedBracket, 7).into();
        assert_eq!(
            err,
            AnalysisError::ModuleSyntax {
                line: 7,
                message: "unmatched bracket".to_string()
            }
        );
    }
}
