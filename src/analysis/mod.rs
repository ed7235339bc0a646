//! Incremental call-site analysis.
//!
//! After an edit, [`analyze_changed_scopes`] walks only the scopes
//! whose lines changed, recording call-site facts into the
//! [`ObservationStore`]. The store is derived data and keyed by stable
//! function identities, so cache invalidation can forget it wholesale.

// ============================================================================
// Submodules
// ============================================================================

pub mod arguments;
pub mod change;
pub mod observations;
pub mod soa;

// ============================================================================
// Re-exports
// ============================================================================

pub use arguments::bind_arguments;
pub use change::ChangeRecord;
pub use observations::{CallObservation, FunctionId, ObservationStore, TypeFact};
pub use soa::{analyze_all, analyze_changed_scopes, analyze_module, function_id};
