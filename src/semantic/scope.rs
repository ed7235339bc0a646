//! The scope tree of one module snapshot.
//!
//! Scopes are stored in an arena (`Vec<Scope>`) and referenced by
//! [`ScopeId`]; the parent link is an `Option<ScopeId>` and children
//! are kept in source order. The tree is built once per snapshot and
//! immutable afterwards.
//!
//! Invariants maintained by the builder:
//! - a child's line range nests inside its parent's;
//! - sibling ranges are disjoint;
//! - the root is the module scope, covering the whole buffer.

use rustc_hash::FxHashMap;

use crate::semantic::object::{Binding, ObjectId};
use crate::syntax::ast::Stmt;

/// Arena index of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

pub const ROOT_SCOPE: ScopeId = ScopeId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    /// The def/class name, or the module name for the root.
    pub name: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Names bound directly in this scope.
    pub bindings: FxHashMap<String, Binding>,
    /// The object this scope belongs to (function or class object;
    /// the module object for the root).
    pub object: Option<ObjectId>,
    /// Statements directly in this scope; nested def/class bodies live
    /// in their own scopes.
    pub stmts: Vec<Stmt>,
    /// 1-based inclusive line range.
    pub start_line: usize,
    pub end_line: usize,
}

impl Scope {
    pub fn contains_line(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }
}

#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(
        &mut self,
        kind: ScopeKind,
        name: impl Into<String>,
        parent: Option<ScopeId>,
        start_line: usize,
        end_line: usize,
    ) -> ScopeId {
        let id = ScopeId::new(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            name: name.into(),
            parent,
            children: Vec::new(),
            bindings: FxHashMap::default(),
            object: None,
            stmts: Vec::new(),
            start_line,
            end_line,
        });
        if let Some(parent) = parent {
            self.scopes[parent.index()].children.push(id);
        }
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, s)| (ScopeId::new(i), s))
    }

    /// The innermost scope whose line range contains `line`.
    pub fn inner_scope_for_line(&self, line: usize) -> ScopeId {
        let mut current = ROOT_SCOPE;
        loop {
            let scope = self.get(current);
            let next = scope
                .children
                .iter()
                .copied()
                .find(|&child| self.get(child).contains_line(line));
            match next {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Walk from `scope` to the root, innermost first.
    pub fn chain(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), |&id| self.get(id).parent)
    }
}
