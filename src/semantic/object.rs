//! Semantic objects and name bindings.
//!
//! All objects of one module snapshot live in an [`ObjectArena`];
//! [`ObjectId`] is the only way to refer to one. Objects are built once
//! by the module builder and never mutated afterwards; inferred facts
//! about them (parameter types, return types) live in the observation
//! store, not here.

use rustc_hash::FxHashMap;

use crate::syntax::ast::Param;

/// Arena index of a semantic object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Where a binding was introduced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    /// Defined in analyzed source: the module's path and the 1-based
    /// line of the defining statement.
    Location { resource: String, line: usize },
    /// Defined outside analyzed source (builtins, unresolved imports).
    External,
}

/// What a name is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundObject {
    /// An object in this module's arena.
    Local(ObjectId),
    /// An imported module, not resolved until a workspace asks for it.
    /// `level` counts the leading dots of a relative import.
    DeferredModule { name: String, level: usize },
    /// A single name imported from a module (`from m import x`),
    /// resolved through the module on demand.
    DeferredImported {
        module: String,
        level: usize,
        name: String,
    },
    /// A builtin, identified by name in the builtin table.
    Builtin(String),
    /// Bound, but to nothing the analysis can see through.
    Unknown,
}

/// A name binding: the bound object plus where the binding came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub object: BoundObject,
    pub definition: Definition,
}

impl Binding {
    pub fn local(object: ObjectId, resource: &str, line: usize) -> Self {
        Self {
            object: BoundObject::Local(object),
            definition: Definition::Location {
                resource: resource.to_string(),
                line,
            },
        }
    }

    pub fn unknown(resource: &str, line: usize) -> Self {
        Self {
            object: BoundObject::Unknown,
            definition: Definition::Location {
                resource: resource.to_string(),
                line,
            },
        }
    }

    pub fn builtin(name: &str) -> Self {
        Self {
            object: BoundObject::Builtin(name.to_string()),
            definition: Definition::External,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PyObject {
    /// The object behind a whole module; attributes are its top-level
    /// bindings.
    Module {
        name: String,
        attributes: FxHashMap<String, Binding>,
    },
    Class {
        name: String,
        /// Base-class names as written, unresolved.
        bases: Vec<String>,
        /// Class-body bindings plus instance attributes collected from
        /// `self.attr = ...` in methods.
        attributes: FxHashMap<String, Binding>,
    },
    Function {
        name: String,
        params: Vec<Param>,
        /// Whether the function is defined directly in a class body.
        is_method: bool,
    },
    Unknown,
}

impl PyObject {
    pub fn name(&self) -> Option<&str> {
        match self {
            PyObject::Module { name, .. }
            | PyObject::Class { name, .. }
            | PyObject::Function { name, .. } => Some(name),
            PyObject::Unknown => None,
        }
    }

    pub fn attributes(&self) -> Option<&FxHashMap<String, Binding>> {
        match self {
            PyObject::Module { attributes, .. } | PyObject::Class { attributes, .. } => {
                Some(attributes)
            }
            _ => None,
        }
    }
}

/// Arena storage for all objects of one module snapshot.
#[derive(Debug, Default)]
pub struct ObjectArena {
    objects: Vec<PyObject>,
}

impl ObjectArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, object: PyObject) -> ObjectId {
        let id = ObjectId::new(self.objects.len());
        self.objects.push(object);
        id
    }

    pub fn get(&self, id: ObjectId) -> &PyObject {
        &self.objects[id.index()]
    }

    pub fn get_mut(&mut self, id: ObjectId) -> &mut PyObject {
        &mut self.objects[id.index()]
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// A call target, normalized so callers need not distinguish how the
/// callable was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee {
    /// A plain function.
    Function { function: ObjectId },
    /// A class used as a constructor: the call goes to `__init__` with
    /// an implicit instance argument.
    Initializer {
        class: ObjectId,
        init: Option<ObjectId>,
    },
    /// An object called through its `__call__` attribute.
    CallAttribute {
        object: ObjectId,
        function: ObjectId,
    },
}

impl Callee {
    /// The function the arguments actually flow into, when known.
    pub fn target_function(&self) -> Option<ObjectId> {
        match self {
            Callee::Function { function } => Some(*function),
            Callee::Initializer { init, .. } => *init,
            Callee::CallAttribute { function, .. } => Some(*function),
        }
    }

    /// Whether binding arguments must prepend an implicit instance
    /// argument (`self`).
    pub fn has_implicit_argument(&self) -> bool {
        matches!(
            self,
            Callee::Initializer { .. } | Callee::CallAttribute { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_handles_are_stable() {
        let mut arena = ObjectArena::new();
        let a = arena.alloc(PyObject::Unknown);
        let b = arena.alloc(PyObject::Function {
            name: "f".to_string(),
            params: Vec::new(),
            is_method: false,
        });
        assert_ne!(a, b);
        assert_eq!(arena.get(b).name(), Some("f"));
        assert_eq!(arena.get(a).name(), None);
    }

    #[test]
    fn test_callee_normalization_helpers() {
        let f = ObjectId::new(0);
        let c = ObjectId::new(1);
        assert_eq!(Callee::Function { function: f }.target_function(), Some(f));
        assert!(!Callee::Function { function: f }.has_implicit_argument());
        let init = Callee::Initializer {
            class: c,
            init: Some(f),
        };
        assert_eq!(init.target_function(), Some(f));
        assert!(init.has_implicit_argument());
    }
}
