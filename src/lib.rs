//! # pysemantic
//!
//! Core library for Python source analysis: offset navigation, scope
//! resolution, and change-driven reanalysis.
//!
//! This is the semantic half of a refactoring engine: given raw program
//! text and a cursor offset it finds the construct at that offset,
//! resolves it to a binding, and keeps that knowledge consistent as the
//! text is edited. It is a best-effort model for editor tooling, not a
//! type checker.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! analysis  → change-driven reanalysis, static call-site inference
//!   ↓
//! project   → resources, module cache, invalidation
//!   ↓
//! semantic  → scope tree, name bindings, offset resolver
//!   ↓
//! syntax    → statement-level AST and parser
//!   ↓
//! text      → offset navigation, tokenizer, logical lines
//!   ↓
//! base      → primitives (Span, SourceBuffer, error taxonomy)
//! ```

// ============================================================================
// MODULES (dependency order: base → text → syntax → semantic → project → analysis)
// ============================================================================

/// Foundation types: Span, SourceBuffer, error taxonomy
pub mod base;

/// Lexical layer: offset navigation, tokenizer, logical line grouping
pub mod text;

/// Syntax: statement-level AST and the tolerant parser
pub mod syntax;

/// Semantic model: scope arena, name bindings, offset resolver
pub mod semantic;

/// Project management: resources, module cache, invalidation
pub mod project;

/// Object inference: change detection and static call-site analysis
pub mod analysis;

// Re-export foundation types
pub use base::{AnalysisError, ParseError, ParseErrorKind, SourceBuffer, Span};
pub use project::{Resource, ResourceEvent, ResourceKind, Workspace};
pub use semantic::{Binding, Definition, Module, ScopeId, ScopeKind};
