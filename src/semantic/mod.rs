//! Scope trees, semantic objects and offset-based name resolution.
//!
//! A [`Module`] is an immutable snapshot: scope arena, object arena and
//! source buffer built together by [`builder::build_module`]. The
//! [`ScopeNameFinder`] resolves offsets against one snapshot and is
//! safe to use from several readers at once since nothing here mutates
//! after construction.

// ============================================================================
// Submodules
// ============================================================================

pub mod builder;
pub mod builtins;
pub mod module;
pub mod object;
pub mod resolve;
pub mod scope;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::build_module;
pub use module::Module;
pub use object::{Binding, BoundObject, Callee, Definition, ObjectArena, ObjectId, PyObject};
pub use resolve::ScopeNameFinder;
pub use scope::{ROOT_SCOPE, Scope, ScopeArena, ScopeId, ScopeKind};
