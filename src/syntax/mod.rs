//! Python-subset syntax: the statement-level AST and its tolerant
//! parser.
//!
//! The rest of the crate reaches this layer only through
//! [`parse_module`]; nothing above it touches tokens directly, so a
//! richer parser can be substituted behind the same seam.

// ============================================================================
// Submodules
// ============================================================================

pub mod ast;
pub mod parser;

// ============================================================================
// Re-exports
// ============================================================================

pub use ast::{ClassDef, Expr, FunctionDef, ImportName, Param, Stmt, StmtKind};
pub use parser::{Parsed, parse_module};
