//! Accumulated call-site facts, keyed by function identity.
//!
//! The store is derived data: everything in it can be rebuilt by
//! re-walking modules, so cache invalidation simply forgets all of it
//! rather than tracking which observations a change could affect.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// Identity of a function across snapshots: defining resource, header
/// line and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionId {
    pub resource: String,
    pub line: usize,
    pub name: String,
}

impl FunctionId {
    pub fn new(resource: impl Into<String>, line: usize, name: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            line,
            name: name.into(),
        }
    }

    pub fn builtin(name: &str) -> Self {
        Self {
            resource: "<builtin>".to_string(),
            line: 0,
            name: name.to_string(),
        }
    }
}

/// What a call site statically says about one argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeFact {
    Str,
    Num,
    /// An instance of the named class (a constructor call result, or
    /// the implicit instance argument).
    Instance { class: String },
    /// The named function object itself.
    Function { name: String },
    Unknown,
}

/// One observed call: per-parameter facts in formal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallObservation {
    pub args: Vec<(String, TypeFact)>,
}

#[derive(Debug, Default)]
pub struct ObservationStore {
    calls: FxHashMap<FunctionId, Vec<CallObservation>>,
    returns: FxHashMap<FunctionId, Vec<TypeFact>>,
}

impl ObservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_call(&mut self, function: FunctionId, observation: CallObservation) {
        self.calls.entry(function).or_default().push(observation);
    }

    pub fn record_return(&mut self, function: FunctionId, fact: TypeFact) {
        self.returns.entry(function).or_default().push(fact);
    }

    pub fn observations(&self, function: &FunctionId) -> &[CallObservation] {
        self.calls.get(function).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn return_facts(&self, function: &FunctionId) -> &[TypeFact] {
        self.returns.get(function).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Per-parameter refinement over all observed calls: a parameter
    /// whose observations all agree gets that fact, anything else is
    /// `Unknown`. Parameters keep formal order.
    pub fn parameter_kinds(&self, function: &FunctionId) -> IndexMap<String, TypeFact> {
        let mut kinds: IndexMap<String, Option<TypeFact>> = IndexMap::new();
        for observation in self.observations(function) {
            for (name, fact) in &observation.args {
                match kinds.get_mut(name) {
                    None => {
                        kinds.insert(name.clone(), Some(fact.clone()));
                    }
                    Some(existing) => {
                        if existing.as_ref() != Some(fact) {
                            *existing = None;
                        }
                    }
                }
            }
        }
        kinds
            .into_iter()
            .map(|(name, fact)| (name, fact.unwrap_or(TypeFact::Unknown)))
            .collect()
    }

    /// Drop everything. Wired to cache invalidation: observations may
    /// reference code that no longer exists.
    pub fn forget_all(&mut self) {
        self.calls.clear();
        self.returns.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.returns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(args: &[(&str, TypeFact)]) -> CallObservation {
        CallObservation {
            args: args
                .iter()
                .map(|(n, f)| (n.to_string(), f.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_agreeing_observations_refine_parameter() {
        let mut store = ObservationStore::new();
        let f = FunctionId::new("m.py", 1, "f");
        store.record_call(f.clone(), obs(&[("a", TypeFact::Num)]));
        store.record_call(f.clone(), obs(&[("a", TypeFact::Num)]));
        let kinds = store.parameter_kinds(&f);
        assert_eq!(kinds.get("a"), Some(&TypeFact::Num));
    }

    #[test]
    fn test_conflicting_observations_degrade_to_unknown() {
        let mut store = ObservationStore::new();
        let f = FunctionId::new("m.py", 1, "f");
        store.record_call(f.clone(), obs(&[("a", TypeFact::Num)]));
        store.record_call(f.clone(), obs(&[("a", TypeFact::Str)]));
        let kinds = store.parameter_kinds(&f);
        assert_eq!(kinds.get("a"), Some(&TypeFact::Unknown));
    }

    #[test]
    fn test_forget_all_clears_everything() {
        let mut store = ObservationStore::new();
        let f = FunctionId::new("m.py", 1, "f");
        store.record_call(f.clone(), obs(&[("a", TypeFact::Num)]));
        store.record_return(FunctionId::builtin("len"), TypeFact::Num);
        assert!(!store.is_empty());
        store.forget_all();
        assert!(store.is_empty());
        assert!(store.observations(&f).is_empty());
    }
}
