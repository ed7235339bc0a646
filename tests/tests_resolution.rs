//! End-to-end resolution scenarios through the workspace facade.

use pysemantic::project::MemoryStore;
use pysemantic::semantic::object::{BoundObject, Callee};
use pysemantic::{AnalysisError, Definition, Resource, Workspace};

fn workspace_with(text: &str) -> (Workspace<MemoryStore>, Resource) {
    let store = MemoryStore::with_files([("mod.py", text)]);
    (Workspace::new(store), Resource::file("mod.py"))
}

#[test]
fn test_local_binding_resolves_to_defining_line() {
    let text = "def f():\n    a = 10\n    return a\n";
    let (mut ws, resource) = workspace_with(text);
    let offset = text.rfind('a').unwrap();
    let (name, binding) = ws.resolve(&resource, offset).unwrap();
    assert_eq!(name.as_deref(), Some("a"));
    let binding = binding.expect("local name resolves");
    assert_eq!(
        binding.definition,
        Definition::Location {
            resource: "mod.py".to_string(),
            line: 2
        }
    );
}

#[test]
fn test_class_attribute_invisible_inside_method() {
    let text = "class C(object):\n    x = 1\n    def m(self):\n        return x\n";
    let (mut ws, resource) = workspace_with(text);

    // Unqualified `x` inside the method does not see the class body.
    let inner = text.rfind('x').unwrap();
    let (name, binding) = ws.resolve(&resource, inner).unwrap();
    assert_eq!(name.as_deref(), Some("x"));
    assert!(binding.is_none());

    // The class-body `x` resolves to its own binding on line 2.
    let class_level = text.find('x').unwrap();
    let (_, binding) = ws.resolve(&resource, class_level).unwrap();
    let binding = binding.expect("class attribute resolves at class level");
    assert_eq!(
        binding.definition,
        Definition::Location {
            resource: "mod.py".to_string(),
            line: 2
        }
    );
}

#[test]
fn test_constructor_reference_normalizes_to_initializer() {
    let text = "class C(object):\n    def __init__(self, x):\n        self.x = x\n\nc = C(1)\n";
    let (mut ws, resource) = workspace_with(text);
    let offset = text.rfind('C').unwrap();
    let callee = ws
        .enclosing_function(&resource, offset)
        .unwrap()
        .expect("class reference is callable");
    match callee {
        Callee::Initializer { init, .. } => assert!(init.is_some()),
        other => panic!("expected initializer, got {other:?}"),
    }
    assert!(callee.has_implicit_argument());
}

#[test]
fn test_resolve_reports_dotted_primary() {
    let text = "c = make()\ny = c.b\n";
    let (mut ws, resource) = workspace_with(text);
    let offset = text.rfind('b').unwrap();
    let (name, _) = ws.resolve(&resource, offset).unwrap();
    assert_eq!(name.as_deref(), Some("c.b"));
}

#[test]
fn test_from_import_names_stay_deferred() {
    let text = "from pkg.mod import thing\n";
    let (mut ws, resource) = workspace_with(text);
    let offset = text.find("thing").unwrap();
    let (_, binding) = ws.resolve(&resource, offset).unwrap();
    match binding.expect("imported name has a deferred binding").object {
        BoundObject::DeferredImported { module, name, .. } => {
            assert_eq!(module, "pkg.mod");
            assert_eq!(name, "thing");
        }
        other => panic!("expected deferred import, got {other:?}"),
    }
}

#[test]
fn test_missing_resource_is_module_not_found() {
    let (mut ws, _) = workspace_with("x = 1\n");
    let missing = Resource::file("absent.py");
    let err = ws.resolve(&missing, 0).unwrap_err();
    assert!(matches!(err, AnalysisError::ModuleNotFound { .. }));
}

#[test]
fn test_strict_workspace_propagates_syntax_errors() {
    let store = MemoryStore::with_files([("bad.py", "def :\n    pass\n")]);
    let mut ws = Workspace::strict(store);
    let err = ws.module(&Resource::file("bad.py")).unwrap_err();
    assert!(matches!(err, AnalysisError::ModuleSyntax { .. }));
}

#[test]
fn test_tolerant_workspace_keeps_degraded_module_usable() {
    let text = "def :\n    pass\n\ngood = 1\n";
    let (mut ws, resource) = workspace_with(text);
    let module = ws.module(&resource).unwrap();
    assert!(module.degraded);
    let offset = text.find("good").unwrap();
    let (name, binding) = ws.resolve(&resource, offset).unwrap();
    assert_eq!(name.as_deref(), Some("good"));
    assert!(binding.is_some());
}
