//! The workspace: one project's text store, module cache, call
//! observations and change observers behind a single facade.
//!
//! All mutation funnels through [`Workspace::notify`]: the host reports
//! what changed, the workspace evicts the affected cache entries, drops
//! derived call observations (they may reference code that no longer
//! exists) and then dispatches the event to registered observers in
//! order.

use std::rc::Rc;

use tracing::trace;

use crate::analysis::observations::ObservationStore;
use crate::analysis::soa;
use crate::base::AnalysisError;
use crate::project::cache::ModuleCache;
use crate::project::resource::{Resource, ResourceEvent, ResourceKind, ResourceObserver, TextStore};
use crate::semantic::module::Module;
use crate::semantic::object::{Binding, Callee};
use crate::semantic::resolve::ScopeNameFinder;
use crate::semantic::scope::ScopeId;

pub struct Workspace<S: TextStore> {
    store: S,
    cache: ModuleCache,
    observations: ObservationStore,
    observers: Vec<Box<dyn ResourceObserver>>,
}

impl<S: TextStore> Workspace<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: ModuleCache::new(),
            observations: ObservationStore::new(),
            observers: Vec::new(),
        }
    }

    /// A workspace whose module builds fail on syntax errors instead of
    /// caching degraded snapshots.
    pub fn strict(store: S) -> Self {
        Self {
            cache: ModuleCache::strict(),
            ..Self::new(store)
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn observations(&self) -> &ObservationStore {
        &self.observations
    }

    pub fn add_observer(&mut self, observer: Box<dyn ResourceObserver>) {
        self.observers.push(observer);
    }

    // ========================================================================
    // Module lookup
    // ========================================================================

    /// The module snapshot behind a resource. A folder resolves to its
    /// package module (`__init__.py`).
    pub fn module(&mut self, resource: &Resource) -> Result<Rc<Module>, AnalysisError> {
        let path = match resource.kind {
            ResourceKind::File => resource.path.clone(),
            ResourceKind::Folder => format!("{}/__init__.py", resource.path),
        };
        self.module_at(&path)
    }

    /// Look a module up by dotted name from the project root.
    pub fn module_by_name(&mut self, name: &str) -> Result<Rc<Module>, AnalysisError> {
        let rel = name.replace('.', "/");
        let path = self
            .find_module_path(&rel)
            .ok_or_else(|| AnalysisError::ModuleNotFound {
                name: name.to_string(),
            })?;
        self.module_at(&path)
    }

    /// Resolve a relative import seen in `base`: `level` counts the
    /// leading dots, `name` is the dotted path after them (may be empty
    /// for `from . import x`).
    pub fn relative_module(
        &mut self,
        base: &Resource,
        name: &str,
        level: usize,
    ) -> Result<Rc<Module>, AnalysisError> {
        if level == 0 {
            return self.module_by_name(name);
        }
        let mut dir = base.parent().map(|p| p.path).unwrap_or_default();
        for _ in 1..level {
            dir = match dir.rfind('/') {
                Some(i) => dir[..i].to_string(),
                None => String::new(),
            };
        }
        let rel = if name.is_empty() {
            dir
        } else if dir.is_empty() {
            name.replace('.', "/")
        } else {
            format!("{dir}/{}", name.replace('.', "/"))
        };
        let path = self
            .find_module_path(&rel)
            .ok_or_else(|| AnalysisError::ModuleNotFound {
                name: name.to_string(),
            })?;
        self.module_at(&path)
    }

    fn module_at(&mut self, path: &str) -> Result<Rc<Module>, AnalysisError> {
        let text = self
            .store
            .read(path)
            .ok_or_else(|| AnalysisError::ModuleNotFound {
                name: module_name_of(path),
            })?;
        self.cache.get_or_build(&module_name_of(path), path, &text)
    }

    fn find_module_path(&self, rel: &str) -> Option<String> {
        let file = format!("{rel}.py");
        if self.store.exists(&file) {
            return Some(file);
        }
        let package = format!("{rel}/__init__.py");
        if self.store.exists(&package) {
            return Some(package);
        }
        None
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// The primary expression at `offset` in the resource's text and
    /// its binding.
    pub fn resolve(
        &mut self,
        resource: &Resource,
        offset: usize,
    ) -> Result<(Option<String>, Option<Binding>), AnalysisError> {
        let module = self.module(resource)?;
        let finder = ScopeNameFinder::new(&module);
        Ok(finder.resolve_offset(offset))
    }

    /// The normalized call target at `offset`, when the offset is on a
    /// callable reference.
    pub fn enclosing_function(
        &mut self,
        resource: &Resource,
        offset: usize,
    ) -> Result<Option<Callee>, AnalysisError> {
        let module = self.module(resource)?;
        let finder = ScopeNameFinder::new(&module);
        Ok(finder.enclosing_function(offset))
    }

    // ========================================================================
    // Analysis
    // ========================================================================

    /// Walk every scope of the resource's module, recording call
    /// observations.
    pub fn analyze(&mut self, resource: &Resource) -> Result<Vec<ScopeId>, AnalysisError> {
        let module = self.module(resource)?;
        Ok(soa::analyze_all(&module, &mut self.observations))
    }

    /// Re-walk only the scopes whose lines changed relative to
    /// `old_text`.
    pub fn analyze_changes(
        &mut self,
        resource: &Resource,
        old_text: &str,
    ) -> Result<Vec<ScopeId>, AnalysisError> {
        let module = self.module(resource)?;
        Ok(soa::analyze_changed_scopes(
            &module,
            old_text,
            &mut self.observations,
        ))
    }

    // ========================================================================
    // Change handling
    // ========================================================================

    /// Write new text for a file and process the resulting change
    /// event.
    pub fn write(&mut self, resource: &Resource, text: &str) {
        self.store.write(&resource.path, text);
        self.notify(&ResourceEvent::Changed(resource.clone()));
    }

    /// Process one project change: evict affected cache entries, drop
    /// derived observations, then dispatch to observers serially.
    pub fn notify(&mut self, event: &ResourceEvent) {
        trace!("[WS] event={:?}", event);
        match event {
            ResourceEvent::Created(r) | ResourceEvent::Removed(r) | ResourceEvent::Changed(r) => {
                self.invalidate(r);
            }
            ResourceEvent::Moved { from, to } => {
                self.invalidate(from);
                self.invalidate(to);
            }
        }
        self.observations.forget_all();
        let mut observers = std::mem::take(&mut self.observers);
        for observer in observers.iter_mut() {
            observer.resource_changed(event);
        }
        self.observers = observers;
    }

    fn invalidate(&mut self, resource: &Resource) {
        match resource.kind {
            ResourceKind::File => self.cache.invalidate(&resource.path),
            ResourceKind::Folder => {
                self.cache.invalidate(&resource.path);
                self.cache.invalidate_under(&resource.path);
            }
        }
    }

    /// Unconditionally drop all derived observation data, e.g. after
    /// code outside the analysis ran and may have changed anything.
    pub fn forget_all_data(&mut self) {
        self.observations.forget_all();
    }
}

/// Dotted module name of a resource path: `pkg/mod.py` is `pkg.mod`,
/// `pkg/__init__.py` is `pkg`.
fn module_name_of(path: &str) -> String {
    let rel = path.strip_suffix(".py").unwrap_or(path);
    let rel = rel.strip_suffix("/__init__").unwrap_or(rel);
    rel.replace('/', ".")
}
