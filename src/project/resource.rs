//! Resources: paths into the analyzed project, and the events and
//! stores that move text in and out of it.
//!
//! A [`Resource`] is a normalized, `/`-separated path relative to the
//! project root. The analysis never touches the real filesystem; all
//! reads and writes go through a [`TextStore`], and hosts feed edits
//! back as [`ResourceEvent`]s.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    File,
    Folder,
}

/// A file or folder of the analyzed project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    pub path: String,
    pub kind: ResourceKind,
}

impl Resource {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ResourceKind::File,
        }
    }

    pub fn folder(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ResourceKind::Folder,
        }
    }

    /// Last path component.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(dot) if dot > 0 => &name[..dot],
            _ => name,
        }
    }

    /// The containing folder, or `None` at the project root.
    pub fn parent(&self) -> Option<Resource> {
        let slash = self.path.rfind('/')?;
        Some(Resource::folder(&self.path[..slash]))
    }
}

/// A change in the project, reported by the host after the fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    Created(Resource),
    Removed(Resource),
    Changed(Resource),
    Moved { from: Resource, to: Resource },
}

/// Callback interface for project changes. The workspace dispatches
/// events to observers serially, in registration order.
pub trait ResourceObserver {
    fn resource_changed(&mut self, event: &ResourceEvent);
}

/// Source of module text. Paths use the same normalized form as
/// [`Resource::path`].
pub trait TextStore {
    fn read(&self, path: &str) -> Option<String>;
    fn write(&mut self, path: &str, text: &str);
    fn exists(&self, path: &str) -> bool;
}

/// In-memory store: the test and scratch-buffer backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: FxHashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut store = Self::new();
        for (path, text) in files {
            store.write(path, text);
        }
        store
    }
}

impl TextStore for MemoryStore {
    fn read(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }

    fn write(&mut self, path: &str, text: &str) {
        self.files.insert(path.to_string(), text.to_string());
    }

    fn exists(&self, path: &str) -> bool {
        // A folder exists when any file lives under it.
        self.files.contains_key(path)
            || self
                .files
                .keys()
                .any(|k| k.len() > path.len() && k.starts_with(path) && k.as_bytes()[path.len()] == b'/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_components() {
        let r = Resource::file("pkg/sub/mod.py");
        assert_eq!(r.name(), "mod.py");
        assert_eq!(r.stem(), "mod");
        assert_eq!(r.parent(), Some(Resource::folder("pkg/sub")));
        assert_eq!(
            Resource::folder("pkg/sub").parent(),
            Some(Resource::folder("pkg"))
        );
        assert_eq!(Resource::file("top.py").parent(), None);
    }

    #[test]
    fn test_memory_store_folder_existence() {
        let store = MemoryStore::with_files([("pkg/__init__.py", ""), ("pkg/mod.py", "x = 1\n")]);
        assert!(store.exists("pkg/mod.py"));
        assert!(store.exists("pkg"));
        assert!(!store.exists("pk"));
        assert!(!store.exists("other"));
    }
}
