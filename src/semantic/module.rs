//! One analyzed module snapshot.

use once_cell::sync::OnceCell;

use crate::base::SourceBuffer;
use crate::semantic::object::{ObjectArena, ObjectId};
use crate::semantic::scope::{ScopeArena, ScopeId};
use crate::text::logical::CachedLogicalLines;
use crate::text::worder::Worder;

/// An immutable semantic snapshot of one module: its source buffer,
/// scope tree and object arena. Replaced wholesale when the source
/// changes; safe to share read-only.
#[derive(Debug)]
pub struct Module {
    pub name: String,
    /// Path of the resource this module was read from.
    pub resource: String,
    pub buffer: SourceBuffer,
    pub scopes: ScopeArena,
    pub objects: ObjectArena,
    /// The object representing the module itself.
    pub root_object: ObjectId,
    /// True when the source had a parse error and this snapshot was
    /// built from the recoverable part.
    pub degraded: bool,
    logical: OnceCell<CachedLogicalLines>,
}

impl Module {
    pub(crate) fn new(
        name: String,
        resource: String,
        buffer: SourceBuffer,
        scopes: ScopeArena,
        objects: ObjectArena,
        root_object: ObjectId,
        degraded: bool,
    ) -> Self {
        Self {
            name,
            resource,
            buffer,
            scopes,
            objects,
            root_object,
            degraded,
            logical: OnceCell::new(),
        }
    }

    /// Logical-line index for this snapshot, computed on first use.
    pub fn logical_lines(&self) -> &CachedLogicalLines {
        self.logical
            .get_or_init(|| CachedLogicalLines::new(&self.buffer))
    }

    pub fn worder(&self) -> Worder<'_> {
        Worder::new(&self.buffer)
    }

    /// The innermost scope containing the given character offset.
    pub fn inner_scope_for_offset(&self, offset: usize) -> ScopeId {
        self.scopes
            .inner_scope_for_line(self.buffer.line_of_offset(offset))
    }
}
