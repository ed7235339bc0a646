//! Change-driven reanalysis: observations, edit scoping and the
//! union behavior of overlapping edits.

use pysemantic::analysis::{FunctionId, TypeFact};
use pysemantic::project::MemoryStore;
use pysemantic::{Resource, Workspace};

fn workspace_with(text: &str) -> (Workspace<MemoryStore>, Resource) {
    let store = MemoryStore::with_files([("mod.py", text)]);
    (Workspace::new(store), Resource::file("mod.py"))
}

fn analyzed_names(ws: &mut Workspace<MemoryStore>, resource: &Resource, old: &str) -> Vec<String> {
    let module = ws.module(resource).unwrap();
    let mut names: Vec<String> = ws
        .analyze_changes(resource, old)
        .unwrap()
        .into_iter()
        .map(|id| module.scopes.get(id).name.clone())
        .collect();
    names.sort();
    names
}

#[test]
fn test_keyword_call_records_observation() {
    let text = "def f(a, b=1): pass\nf(a=5, b=6)\n";
    let (mut ws, resource) = workspace_with(text);
    ws.analyze(&resource).unwrap();

    let f = FunctionId::new("mod.py", 1, "f");
    let observations = ws.observations().observations(&f);
    assert_eq!(observations.len(), 1);
    assert_eq!(
        observations[0].args,
        vec![
            ("a".to_string(), TypeFact::Num),
            ("b".to_string(), TypeFact::Num)
        ]
    );
    let kinds = ws.observations().parameter_kinds(&f);
    assert_eq!(kinds.get("a"), Some(&TypeFact::Num));
}

#[test]
fn test_call_in_if_header_records_observation() {
    let text = "def f(a): pass\nif f(1):\n    pass\n";
    let (mut ws, resource) = workspace_with(text);
    ws.analyze(&resource).unwrap();

    let f = FunctionId::new("mod.py", 1, "f");
    let observations = ws.observations().observations(&f);
    assert_eq!(observations.len(), 1);
    assert_eq!(
        observations[0].args,
        vec![("a".to_string(), TypeFact::Num)]
    );
}

#[test]
fn test_sequential_edits_reanalyze_disjoint_then_union() {
    let v0 = "def f(a):\n    f(1)\n\ndef g(b):\n    g(2)\n";
    let v1 = "def f(a):\n    f(3)\n\ndef g(b):\n    g(2)\n";
    let v2 = "def f(a):\n    f(3)\n\ndef g(b):\n    g(4)\n";
    let v3 = "def f(a):\n    f(5)\n\ndef g(b):\n    g(6)\n";

    let (mut ws, resource) = workspace_with(v0);
    ws.analyze(&resource).unwrap();

    // First edit touches only f's body.
    ws.write(&resource, v1);
    assert_eq!(analyzed_names(&mut ws, &resource, v0), vec!["f"]);

    // Second edit touches only g's body.
    ws.write(&resource, v2);
    assert_eq!(analyzed_names(&mut ws, &resource, v1), vec!["g"]);

    // An edit overlapping both ranges reanalyzes the union.
    ws.write(&resource, v3);
    assert_eq!(analyzed_names(&mut ws, &resource, v2), vec!["f", "g"]);
}

#[test]
fn test_unchanged_text_reanalyzes_nothing() {
    let text = "def f(a):\n    f(1)\n";
    let (mut ws, resource) = workspace_with(text);
    ws.analyze(&resource).unwrap();
    ws.forget_all_data();
    assert!(analyzed_names(&mut ws, &resource, text).is_empty());
    assert!(ws.observations().is_empty());
}

#[test]
fn test_module_level_edit_does_not_reenter_functions() {
    let v0 = "x = 1\n\ndef f(a):\n    f(1)\n";
    let v1 = "x = 2\n\ndef f(a):\n    f(1)\n";
    let (mut ws, resource) = workspace_with(v0);
    ws.analyze(&resource).unwrap();
    ws.write(&resource, v1);
    // The module scope changed; f's range did not.
    assert_eq!(analyzed_names(&mut ws, &resource, v0), vec!["mod"]);
}

#[test]
fn test_invalidation_forgets_derived_observations() {
    let text = "def f(a): pass\nf(1)\n";
    let (mut ws, resource) = workspace_with(text);
    ws.analyze(&resource).unwrap();
    assert!(!ws.observations().is_empty());
    ws.write(&resource, text);
    assert!(ws.observations().is_empty());
}
