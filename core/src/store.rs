//! Client-side persisted key-value storage.
//!
//! The bearer token lives under [`AUTH_TOKEN_KEY`] and is read on every
//! outgoing request, so a login or logout elsewhere takes effect on the
//! next call without rebuilding the adapter.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::warn;

/// Key under which the bearer token is persisted.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// File-backed store when `path` is given, in-memory otherwise.
pub fn open_store(path: Option<&Path>) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    let store: Arc<dyn KeyValueStore> = match path {
        Some(path) => Arc::new(FileStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

/// In-process store. Values live as long as the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a bearer token.
    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.set(AUTH_TOKEN_KEY, token);
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
    }
}

/// Store persisted as a JSON object on disk.
///
/// The file is read once on open and rewritten in full on every `set` and
/// `remove`. A write failure keeps the in-memory value and is reported
/// through `tracing`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = load(&path)?.unwrap_or_default();
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        apply(&mut entries);
        if let Err(e) = save(&self.path, &entries) {
            warn!(path = %self.path.display(), error = %e, "failed to persist store");
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        });
    }

    fn remove(&self, key: &str) {
        self.update(|entries| {
            entries.remove(key);
        });
    }
}

fn load(path: &Path) -> Result<Option<BTreeMap<String, String>>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    let entries = serde_json::from_str(&contents)?;
    Ok(Some(entries))
}

fn save(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get(AUTH_TOKEN_KEY), None);
        store.set(AUTH_TOKEN_KEY, "abc");
        assert_eq!(store.get(AUTH_TOKEN_KEY).as_deref(), Some("abc"));
        store.remove(AUTH_TOKEN_KEY);
        assert_eq!(store.get(AUTH_TOKEN_KEY), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("store.json");

        let first = FileStore::open(&path).unwrap();
        assert_eq!(first.get(AUTH_TOKEN_KEY), None);
        first.set(AUTH_TOKEN_KEY, "persisted");
        drop(first);

        let second = FileStore::open(&path).unwrap();
        assert_eq!(second.get(AUTH_TOKEN_KEY).as_deref(), Some("persisted"));

        second.remove(AUTH_TOKEN_KEY);
        let third = FileStore::open(&path).unwrap();
        assert_eq!(third.get(AUTH_TOKEN_KEY), None);
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StoreError::Serde(_))));
    }

    #[test]
    fn open_store_picks_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        open_store(Some(path.as_path())).unwrap().set(AUTH_TOKEN_KEY, "t");
        let reopened = open_store(Some(path.as_path())).unwrap();
        assert_eq!(reopened.get(AUTH_TOKEN_KEY).as_deref(), Some("t"));
        assert_eq!(open_store(None).unwrap().get(AUTH_TOKEN_KEY), None);
    }
}
