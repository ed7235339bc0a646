//! Memoized module snapshots, one entry per resource path.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::base::AnalysisError;
use crate::semantic::builder::build_module;
use crate::semantic::module::Module;

/// Cache of built [`Module`] snapshots keyed by resource path.
///
/// In strict mode a parse error fails the build and nothing is cached,
/// so a partial failure never leaves a corrupt entry behind; in
/// tolerant mode the degraded snapshot is cached like any other.
#[derive(Debug, Default)]
pub struct ModuleCache {
    modules: FxHashMap<String, Rc<Module>>,
    strict: bool,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            modules: FxHashMap::default(),
            strict: true,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn get(&self, path: &str) -> Option<Rc<Module>> {
        self.modules.get(path).cloned()
    }

    /// The cached snapshot for `path`, building it from `text` on a
    /// miss.
    pub fn get_or_build(
        &mut self,
        name: &str,
        path: &str,
        text: &str,
    ) -> Result<Rc<Module>, AnalysisError> {
        if let Some(module) = self.modules.get(path) {
            return Ok(module.clone());
        }
        let (module, error) = build_module(name, path, text);
        if self.strict {
            if let Some(error) = error {
                return Err(error.into());
            }
        }
        let module = Rc::new(module);
        trace!("[CACHE] built path={} degraded={}", path, module.degraded);
        self.modules.insert(path.to_string(), module.clone());
        Ok(module)
    }

    /// Evict exactly this entry. Idempotent: evicting a missing entry
    /// is a no-op.
    pub fn invalidate(&mut self, path: &str) {
        if self.modules.remove(path).is_some() {
            trace!("[CACHE] invalidated path={}", path);
        }
    }

    /// Evict every entry inside the given folder.
    pub fn invalidate_under(&mut self, folder: &str) {
        self.modules.retain(|path, _| {
            !(path.starts_with(folder) && path.as_bytes().get(folder.len()) == Some(&b'/'))
        });
    }

    pub fn clear(&mut self) {
        self.modules.clear();
    }

    pub fn contains(&self, path: &str) -> bool {
        self.modules.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_memoizes_per_path() {
        let mut cache = ModuleCache::new();
        let a = cache.get_or_build("m", "m.py", "x = 1\n").unwrap();
        let b = cache.get_or_build("m", "m.py", "ignored = 2\n").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let mut cache = ModuleCache::new();
        cache.get_or_build("m", "m.py", "x = 1\n").unwrap();
        cache.invalidate("m.py");
        cache.invalidate("m.py");
        assert!(cache.is_empty());
        // Rebuild after invalidation picks up new text.
        let rebuilt = cache.get_or_build("m", "m.py", "y = 2\n").unwrap();
        assert!(rebuilt.scopes.get(crate::semantic::scope::ROOT_SCOPE).binding("y").is_some());
    }

    #[test]
    fn test_strict_mode_does_not_cache_failures() {
        let mut cache = ModuleCache::strict();
        let result = cache.get_or_build("m", "m.py", "def :\n    pass\n");
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_tolerant_mode_caches_degraded_module() {
        let mut cache = ModuleCache::new();
        let module = cache.get_or_build("m", "m.py", "def :\n    pass\nx = 1\n").unwrap();
        assert!(module.degraded);
        assert!(cache.contains("m.py"));
    }
}
