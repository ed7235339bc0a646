//! Static analysis of call sites, scheduled per scope.
//!
//! [`analyze_module`] walks a module's scope tree inner-scopes-first,
//! asking two predicates per scope: `search_subscopes` decides whether
//! to descend, `should_analyze` decides whether to walk this scope's
//! own statements. [`analyze_changed_scopes`] wires those predicates
//! to a [`ChangeRecord`] so that after an edit only scopes overlapping
//! the changed lines are re-walked; because each scope *consumes* its
//! changed lines, an enclosing scope is not re-walked when every change
//! fell inside an inner one.
//!
//! Walking a scope resolves each call expression to a normalized
//! [`Callee`], binds its arguments against the formal parameter list
//! and records the result in the [`ObservationStore`]. A subscript
//! assignment `x[k] = v` is a call to `x.__setitem__(k, v)`. Calls that
//! cannot be resolved or bound are skipped silently.

use std::cell::RefCell;

use tracing::trace;

use crate::analysis::arguments::bind_arguments;
use crate::analysis::change::ChangeRecord;
use crate::analysis::observations::{CallObservation, FunctionId, ObservationStore, TypeFact};
use crate::semantic::builtins;
use crate::semantic::module::Module;
use crate::semantic::object::{BoundObject, Callee, ObjectId, PyObject};
use crate::semantic::resolve::ScopeNameFinder;
use crate::semantic::scope::{ROOT_SCOPE, Scope, ScopeId};
use crate::syntax::ast::{Expr, StmtKind};

/// Analyze every scope of the module. Returns the analyzed scopes.
pub fn analyze_all(module: &Module, store: &mut ObservationStore) -> Vec<ScopeId> {
    analyze_module(module, store, &mut |_| true, &mut |_| true)
}

/// Re-analyze only the scopes overlapping lines that differ from
/// `old_text`. Returns the scopes that were actually re-walked.
pub fn analyze_changed_scopes(
    module: &Module,
    old_text: &str,
    store: &mut ObservationStore,
) -> Vec<ScopeId> {
    let record = ChangeRecord::new(module.buffer.text(), old_text);
    if record.is_empty() {
        return Vec::new();
    }
    let record = RefCell::new(record);
    analyze_module(
        module,
        store,
        &mut |scope| {
            record
                .borrow_mut()
                .consume_changes(scope.start_line, scope.end_line)
        },
        &mut |scope| record.borrow().is_changed(scope.start_line, scope.end_line),
    )
}

pub fn analyze_module(
    module: &Module,
    store: &mut ObservationStore,
    should_analyze: &mut dyn FnMut(&Scope) -> bool,
    search_subscopes: &mut dyn FnMut(&Scope) -> bool,
) -> Vec<ScopeId> {
    let mut analyzed = Vec::new();
    analyze_node(
        module,
        store,
        ROOT_SCOPE,
        should_analyze,
        search_subscopes,
        &mut analyzed,
    );
    analyzed
}

fn analyze_node(
    module: &Module,
    store: &mut ObservationStore,
    scope_id: ScopeId,
    should_analyze: &mut dyn FnMut(&Scope) -> bool,
    search_subscopes: &mut dyn FnMut(&Scope) -> bool,
    analyzed: &mut Vec<ScopeId>,
) {
    // Children first: inner scopes consume their changed lines before
    // the enclosing scope asks about its own range.
    if search_subscopes(module.scopes.get(scope_id)) {
        let children = module.scopes.get(scope_id).children.clone();
        for child in children {
            analyze_node(
                module,
                store,
                child,
                should_analyze,
                search_subscopes,
                analyzed,
            );
        }
    }
    if should_analyze(module.scopes.get(scope_id)) {
        visit_scope(module, scope_id, store);
        analyzed.push(scope_id);
    }
}

fn visit_scope(module: &Module, scope_id: ScopeId, store: &mut ObservationStore) {
    let finder = ScopeNameFinder::new(module);
    let scope = module.scopes.get(scope_id);
    trace!("[SOA] scope={} lines={}..{}", scope.name, scope.start_line, scope.end_line);
    for stmt in &scope.stmts {
        if let StmtKind::Assign { targets, value, .. } = &stmt.kind {
            for target in targets {
                if let Expr::Subscript {
                    value: object,
                    index,
                } = target
                {
                    record_setitem(module, &finder, scope_id, object, index, value, store);
                }
            }
        }
        for expr in stmt.exprs() {
            walk_expr(module, &finder, scope_id, expr, store);
        }
    }
}

fn walk_expr(
    module: &Module,
    finder: &ScopeNameFinder<'_>,
    scope: ScopeId,
    expr: &Expr,
    store: &mut ObservationStore,
) {
    if let Expr::Call {
        func,
        args,
        keywords,
        star_args,
        kw_args,
    } = expr
    {
        record_call_site(
            module,
            finder,
            scope,
            func,
            args,
            keywords,
            star_args.is_some(),
            kw_args.is_some(),
            store,
        );
    }
    for child in expr.children() {
        walk_expr(module, finder, scope, child, store);
    }
}

#[allow(clippy::too_many_arguments)]
fn record_call_site(
    module: &Module,
    finder: &ScopeNameFinder<'_>,
    scope: ScopeId,
    func: &Expr,
    args: &[Expr],
    keywords: &[(String, Expr)],
    has_star_args: bool,
    has_kw_args: bool,
    store: &mut ObservationStore,
) {
    let Some(primary) = expr_to_primary(func) else {
        return;
    };
    let Some(binding) = finder.resolve_primary(&primary, scope) else {
        return;
    };

    if let BoundObject::Builtin(name) = &binding.object {
        // Builtin calls yield a return-type fact right away.
        if let Some(returns) = builtins::lookup(name).and_then(|b| b.returns) {
            store.record_return(
                FunctionId::builtin(name),
                TypeFact::Instance {
                    class: returns.to_string(),
                },
            );
        }
        return;
    }

    let Some(callee) = finder.callee_of(&binding) else {
        return;
    };
    let Some(target) = callee.target_function() else {
        return;
    };
    let implicit = implicit_argument(module, &callee);
    let arg_facts: Vec<TypeFact> = args
        .iter()
        .map(|e| fact_of(module, finder, scope, e))
        .collect();
    let kw_facts: Vec<(String, TypeFact)> = keywords
        .iter()
        .map(|(n, e)| (n.clone(), fact_of(module, finder, scope, e)))
        .collect();

    record_bound_call(
        module,
        target,
        implicit,
        &arg_facts,
        &kw_facts,
        has_star_args,
        has_kw_args,
        store,
    );
}

/// `x[k] = v` observes `x.__setitem__(k, v)`.
fn record_setitem(
    module: &Module,
    finder: &ScopeNameFinder<'_>,
    scope: ScopeId,
    object: &Expr,
    index: &Expr,
    value: &Expr,
    store: &mut ObservationStore,
) {
    let Some(class) = receiver_class(module, finder, scope, object) else {
        return;
    };
    let Some(target) = class_method(module, class, "__setitem__") else {
        return;
    };
    let implicit = Some(TypeFact::Instance {
        class: module
            .objects
            .get(class)
            .name()
            .unwrap_or("?")
            .to_string(),
    });
    let facts = [
        fact_of(module, finder, scope, index),
        fact_of(module, finder, scope, value),
    ];
    record_bound_call(module, target, implicit, &facts, &[], false, false, store);
}

/// The class of a subscript receiver, traced through the assignment
/// that bound it: `d = D()` makes `d` an instance of `D`.
fn receiver_class(
    module: &Module,
    finder: &ScopeNameFinder<'_>,
    scope: ScopeId,
    object: &Expr,
) -> Option<ObjectId> {
    let Expr::Name(name) = object else {
        return None;
    };
    for sid in module.scopes.chain(scope) {
        for stmt in &module.scopes.get(sid).stmts {
            let StmtKind::Assign {
                targets,
                value,
                aug_op: None,
            } = &stmt.kind
            else {
                continue;
            };
            if !targets
                .iter()
                .any(|t| matches!(t, Expr::Name(n) if n == name))
            {
                continue;
            }
            let Expr::Call { func, .. } = value else {
                continue;
            };
            let Some(primary) = expr_to_primary(func) else {
                continue;
            };
            let Some(binding) = finder.resolve_primary(&primary, sid) else {
                continue;
            };
            let BoundObject::Local(id) = binding.object else {
                continue;
            };
            if matches!(module.objects.get(id), PyObject::Class { .. }) {
                return Some(id);
            }
        }
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn record_bound_call(
    module: &Module,
    target: ObjectId,
    implicit: Option<TypeFact>,
    args: &[TypeFact],
    keywords: &[(String, TypeFact)],
    has_star_args: bool,
    has_kw_args: bool,
    store: &mut ObservationStore,
) {
    let PyObject::Function { params, .. } = module.objects.get(target) else {
        return;
    };
    let Some(bound) = bind_arguments(params, implicit, args, keywords, has_star_args, has_kw_args)
    else {
        return;
    };
    let Some(function) = function_id(module, target) else {
        return;
    };
    trace!("[SOA] call {} args={}", function.name, bound.len());
    store.record_call(function, CallObservation { args: bound });
}

fn implicit_argument(module: &Module, callee: &Callee) -> Option<TypeFact> {
    match callee {
        Callee::Function { .. } => None,
        Callee::Initializer { class, .. } => Some(TypeFact::Instance {
            class: module
                .objects
                .get(*class)
                .name()
                .unwrap_or("?")
                .to_string(),
        }),
        Callee::CallAttribute { .. } => Some(TypeFact::Unknown),
    }
}

/// The named method among a class's attributes.
fn class_method(module: &Module, class: ObjectId, name: &str) -> Option<ObjectId> {
    let attrs = module.objects.get(class).attributes()?;
    match attrs.get(name)?.object {
        BoundObject::Local(f) if matches!(module.objects.get(f), PyObject::Function { .. }) => {
            Some(f)
        }
        _ => None,
    }
}

/// A fact about an argument expression, derived without inference.
fn fact_of(module: &Module, finder: &ScopeNameFinder<'_>, scope: ScopeId, expr: &Expr) -> TypeFact {
    match expr {
        Expr::Str(_) => TypeFact::Str,
        Expr::Num(_) => TypeFact::Num,
        Expr::Call { func, .. } => {
            let Some(primary) = expr_to_primary(func) else {
                return TypeFact::Unknown;
            };
            match finder.resolve_primary(&primary, scope).map(|b| b.object) {
                Some(BoundObject::Local(id)) => match module.objects.get(id) {
                    PyObject::Class { name, .. } => TypeFact::Instance { class: name.clone() },
                    _ => TypeFact::Unknown,
                },
                Some(BoundObject::Builtin(name)) => builtins::lookup(&name)
                    .and_then(|b| b.returns)
                    .map(|r| TypeFact::Instance {
                        class: r.to_string(),
                    })
                    .unwrap_or(TypeFact::Unknown),
                _ => TypeFact::Unknown,
            }
        }
        Expr::Name(_) | Expr::Attribute { .. } => {
            let Some(primary) = expr_to_primary(expr) else {
                return TypeFact::Unknown;
            };
            match finder.resolve_primary(&primary, scope).map(|b| b.object) {
                Some(BoundObject::Local(id)) => match module.objects.get(id) {
                    PyObject::Function { name, .. } => TypeFact::Function { name: name.clone() },
                    _ => TypeFact::Unknown,
                },
                _ => TypeFact::Unknown,
            }
        }
        _ => TypeFact::Unknown,
    }
}

/// A dotted-name rendering of `Name`/`Attribute` chains; anything else
/// (call results, subscripts) has no static primary.
fn expr_to_primary(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(name) => Some(name.clone()),
        Expr::Attribute { value, attr } => Some(format!("{}.{attr}", expr_to_primary(value)?)),
        _ => None,
    }
}

/// Identity of a function object: its scope's defining line and name.
pub fn function_id(module: &Module, object: ObjectId) -> Option<FunctionId> {
    module
        .scopes
        .iter()
        .find(|(_, s)| s.object == Some(object))
        .map(|(_, s)| FunctionId::new(module.resource.clone(), s.start_line, s.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::builder::build_module;

    fn module(text: &str) -> Module {
        build_module("mod", "mod.py", text).0
    }

    #[test]
    fn test_keyword_call_is_observed() {
        let text = "def f(a=1, b=2):\n    pass\n\nf(a=5, b=6)\n";
        let m = module(text);
        let mut store = ObservationStore::new();
        analyze_all(&m, &mut store);
        let f = FunctionId::new("mod.py", 1, "f");
        let observations = store.observations(&f);
        assert_eq!(observations.len(), 1);
        assert_eq!(
            observations[0].args,
            vec![
                ("a".to_string(), TypeFact::Num),
                ("b".to_string(), TypeFact::Num)
            ]
        );
    }

    #[test]
    fn test_constructor_call_gets_implicit_instance() {
        let text = "class C(object):\n    def __init__(self, x):\n        self.x = x\n\nC(1)\n";
        let m = module(text);
        let mut store = ObservationStore::new();
        analyze_all(&m, &mut store);
        let init = FunctionId::new("mod.py", 2, "__init__");
        let observations = store.observations(&init);
        assert_eq!(observations.len(), 1);
        assert_eq!(
            observations[0].args,
            vec![
                (
                    "self".to_string(),
                    TypeFact::Instance {
                        class: "C".to_string()
                    }
                ),
                ("x".to_string(), TypeFact::Num)
            ]
        );
    }

    #[test]
    fn test_subscript_assignment_observes_setitem() {
        let text = "class D(object):\n    def __setitem__(self, key, value):\n        pass\n\nd = D()\nd['k'] = 3\n";
        let m = module(text);
        let mut store = ObservationStore::new();
        analyze_all(&m, &mut store);
        let setitem = FunctionId::new("mod.py", 2, "__setitem__");
        let observations = store.observations(&setitem);
        assert_eq!(observations.len(), 1);
        assert_eq!(
            observations[0].args,
            vec![
                (
                    "self".to_string(),
                    TypeFact::Instance {
                        class: "D".to_string()
                    }
                ),
                ("key".to_string(), TypeFact::Str),
                ("value".to_string(), TypeFact::Num)
            ]
        );
    }

    #[test]
    fn test_call_in_condition_header_is_observed() {
        let text = "def f(a):\n    pass\n\nif f(1):\n    pass\nwhile f(2):\n    pass\n";
        let m = module(text);
        let mut store = ObservationStore::new();
        analyze_all(&m, &mut store);
        let f = FunctionId::new("mod.py", 1, "f");
        let observations = store.observations(&f);
        assert_eq!(observations.len(), 2);
        assert!(observations
            .iter()
            .all(|o| o.args == vec![("a".to_string(), TypeFact::Num)]));
    }

    #[test]
    fn test_unresolvable_call_is_skipped_silently() {
        let text = "unknown_function(1, 2)\n";
        let m = module(text);
        let mut store = ObservationStore::new();
        analyze_all(&m, &mut store);
        assert!(store.is_empty());
    }

    #[test]
    fn test_changed_scope_analysis_is_scoped() {
        let old = "def f(a):\n    f(1)\n\ndef g(b):\n    g(2)\n";
        let new = "def f(a):\n    f(3)\n\ndef g(b):\n    g(2)\n";
        let m = build_module("mod", "mod.py", new).0;
        let mut store = ObservationStore::new();
        let analyzed = analyze_changed_scopes(&m, old, &mut store);
        let names: Vec<&str> = analyzed
            .iter()
            .map(|&id| m.scopes.get(id).name.as_str())
            .collect();
        assert_eq!(names, vec!["f"]);
        // Only f's call observation exists.
        let f = FunctionId::new("mod.py", 1, "f");
        let g = FunctionId::new("mod.py", 4, "g");
        assert_eq!(store.observations(&f).len(), 1);
        assert!(store.observations(&g).is_empty());
    }

    #[test]
    fn test_overlapping_edit_reanalyzes_enclosing_scope() {
        let old = "x = 1\ndef f(a):\n    f(1)\n";
        let new = "x = 2\ndef f(a):\n    f(1)\n";
        let m = build_module("mod", "mod.py", new).0;
        let mut store = ObservationStore::new();
        let analyzed = analyze_changed_scopes(&m, old, &mut store);
        let names: Vec<&str> = analyzed
            .iter()
            .map(|&id| m.scopes.get(id).name.as_str())
            .collect();
        // The change was at module level, outside f.
        assert_eq!(names, vec!["mod"]);
    }

    #[test]
    fn test_no_change_analyzes_nothing() {
        let text = "def f(a):\n    f(1)\n";
        let m = module(text);
        let mut store = ObservationStore::new();
        let analyzed = analyze_changed_scopes(&m, text, &mut store);
        assert!(analyzed.is_empty());
        assert!(store.is_empty());
    }
}
