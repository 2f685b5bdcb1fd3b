//! Discovery of environments and interpreters, and the session caches
//! behind them.
//!
//! Discovery state is deliberately not process-global: everything reads and
//! writes through a [`Context`] holding the resolved settings and an
//! injected [`CacheStore`], so tests substitute an in-memory store and two
//! contexts never share hidden state.

pub mod environments;
pub mod interpreters;
pub mod metadata;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::Settings;

/// Storage interface for session cache files.
///
/// The filesystem implementation lives under the config directory; the
/// in-memory implementation backs tests. Readers tolerate a missing entry
/// by triggering a rebuild, so `load` distinguishes "absent" from I/O
/// failure.
pub trait CacheStore: Send + Sync {
    /// Load a named cache file; `Ok(None)` when it does not exist.
    fn load(&self, name: &str) -> std::io::Result<Option<String>>;
    /// Persist a named cache file, replacing any previous contents.
    fn save(&self, name: &str, contents: &str) -> std::io::Result<()>;
}

/// Filesystem-backed cache store rooted at a directory.
pub struct FsStore {
    /// Directory holding the cache files.
    root: PathBuf,
}

impl FsStore {
    /// What: Create a store rooted at `root` (typically the config dir).
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl CacheStore for FsStore {
    fn load(&self, name: &str) -> std::io::Result<Option<String>> {
        match std::fs::read_to_string(self.root.join(name)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, name: &str, contents: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.root.join(name), contents)
    }
}

/// In-memory cache store for tests.
#[derive(Default)]
pub struct MemStore {
    /// Name to contents map.
    map: Mutex<HashMap<String, String>>,
}

impl MemStore {
    /// What: Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemStore {
    fn load(&self, name: &str) -> std::io::Result<Option<String>> {
        let map = self
            .map
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(map.get(name).cloned())
    }

    fn save(&self, name: &str, contents: &str) -> std::io::Result<()> {
        let mut map = self
            .map
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        map.insert(name.to_string(), contents.to_string());
        Ok(())
    }
}

/// Explicit context passed into discovery and orchestrator construction.
#[derive(Clone)]
pub struct Context {
    /// Resolved settings.
    pub settings: Settings,
    /// Session cache storage.
    pub store: Arc<dyn CacheStore>,
}

impl Context {
    /// What: Build a context from settings and a store.
    #[must_use]
    pub fn new(settings: Settings, store: Arc<dyn CacheStore>) -> Self {
        Self { settings, store }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: The filesystem store distinguishes absent from present files.
    ///
    /// Inputs:
    /// - A temp-rooted store, before and after one save.
    ///
    /// Output:
    /// - `load` yields `None`, then the saved contents.
    fn index_fs_store_round_trip_and_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsStore::new(dir.path().to_path_buf());
        assert_eq!(store.load("interpreters.csv").expect("load"), None);
        store
            .save("interpreters.csv", "PYTHON_VERSION,PYTHON_PATH\n")
            .expect("save");
        assert_eq!(
            store.load("interpreters.csv").expect("load"),
            Some("PYTHON_VERSION,PYTHON_PATH\n".to_string())
        );
    }

    #[test]
    /// What: The in-memory store behaves like the filesystem store.
    ///
    /// Inputs:
    /// - One save then load on a fresh `MemStore`.
    ///
    /// Output:
    /// - Absent before, present after, contents intact.
    fn index_mem_store_round_trip() {
        let store = MemStore::new();
        assert_eq!(store.load("x").expect("load"), None);
        store.save("x", "payload").expect("save");
        assert_eq!(store.load("x").expect("load"), Some("payload".to_string()));
    }
}
