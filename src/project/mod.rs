//! Project management: resources, the module cache and change events.

// ============================================================================
// Submodules
// ============================================================================

pub mod cache;
pub mod resource;
pub mod workspace;

// ============================================================================
// Re-exports
// ============================================================================

pub use cache::ModuleCache;
pub use resource::{MemoryStore, Resource, ResourceEvent, ResourceKind, ResourceObserver, TextStore};
pub use workspace::Workspace;
