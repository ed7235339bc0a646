//! Workspace-level behavior: cache invalidation, structural
//! invariants across rebuilds, and import-path lookups.

use std::rc::Rc;

use pysemantic::project::MemoryStore;
use pysemantic::semantic::Module;
use pysemantic::{Resource, ResourceEvent, Workspace};

fn project() -> Workspace<MemoryStore> {
    Workspace::new(MemoryStore::with_files([
        (
            "app.py",
            "class App(object):\n    def run(self):\n        self.count = 0\n\ndef main():\n    app = App()\n    app.run()\n",
        ),
        ("pkg/__init__.py", ""),
        ("pkg/util.py", "def helper(x):\n    return x\n"),
    ]))
}

fn assert_scope_invariants(module: &Module) {
    for (_, scope) in module.scopes.iter() {
        assert!(scope.start_line <= scope.end_line);
        for &child in &scope.children {
            let child = module.scopes.get(child);
            assert!(
                scope.start_line <= child.start_line && child.end_line <= scope.end_line,
                "child range escapes its parent"
            );
        }
        for pair in scope.children.windows(2) {
            let a = module.scopes.get(pair[0]);
            let b = module.scopes.get(pair[1]);
            assert!(
                a.end_line < b.start_line || b.end_line < a.start_line,
                "sibling scopes overlap"
            );
        }
    }
}

#[test]
fn test_scope_invariants_hold_across_invalidation() {
    let mut ws = project();
    let resource = Resource::file("app.py");
    let before = ws.module(&resource).unwrap();
    assert_scope_invariants(&before);

    ws.write(
        &resource,
        "class App(object):\n    def run(self):\n        self.count = 0\n    def stop(self):\n        self.count = -1\n\ndef main():\n    App().run()\n",
    );
    let after = ws.module(&resource).unwrap();
    assert!(!Rc::ptr_eq(&before, &after));
    assert_scope_invariants(&after);
}

#[test]
fn test_rebuild_happens_once_per_invalidation() {
    let mut ws = project();
    let resource = Resource::file("app.py");
    let first = ws.module(&resource).unwrap();
    let again = ws.module(&resource).unwrap();
    assert!(Rc::ptr_eq(&first, &again), "cache memoizes per resource");

    ws.notify(&ResourceEvent::Changed(resource.clone()));
    let rebuilt = ws.module(&resource).unwrap();
    assert!(!Rc::ptr_eq(&first, &rebuilt));
}

#[test]
fn test_package_and_relative_lookup() {
    let mut ws = project();
    assert_eq!(ws.module_by_name("pkg.util").unwrap().name, "pkg.util");
    assert_eq!(ws.module_by_name("pkg").unwrap().name, "pkg");

    let base = Resource::file("pkg/util.py");
    let own_package = ws.relative_module(&base, "", 1).unwrap();
    assert_eq!(own_package.name, "pkg");
    let top = ws.relative_module(&base, "app", 2).unwrap();
    assert_eq!(top.name, "app");
}

#[test]
fn test_folder_resource_resolves_to_package_module() {
    let mut ws = project();
    let package = ws.module(&Resource::folder("pkg")).unwrap();
    assert_eq!(package.name, "pkg");
    assert_eq!(package.resource, "pkg/__init__.py");
}
