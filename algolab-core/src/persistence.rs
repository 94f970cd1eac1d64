//! Write-through persistence: an in-memory map backed by JSON files.
//!
//! Collapses the memory-then-file dual-write pattern into a single policy:
//! reads consult the cache first and fall back to disk, writes update both
//! in one call. File writes go through a `.tmp` sibling and an atomic
//! rename so a crash cannot leave a half-written value behind.

use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{CoreError, Result};

/// Keyed blob persistence used by the learning-path bookkeeping.
///
/// Keys are caller-owned identifiers; `/` separates logical namespaces
/// (e.g. `progress/alice`).
pub trait KvStore: Send + Sync {
    /// Load the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`.
    fn save(&self, key: &str, value: Value) -> Result<()>;
}

/// Purely in-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Write-through cache over a directory of JSON files.
pub struct CachedFileStore {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Value>>,
}

impl CachedFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        // Keys must stay inside the data directory.
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(CoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KvStore for CachedFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(value) = cache.get(key) {
                return Ok(Some(value.clone()));
            }
        }

        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        let value: Value = serde_json::from_str(&text)?;

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(key.to_string(), value.clone());
        Ok(Some(value))
    }

    fn save(&self, key: &str, value: Value) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&value)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load("missing").unwrap().is_none());
        store.save("k", json!({ "a": 1 })).unwrap();
        assert_eq!(store.load("k").unwrap(), Some(json!({ "a": 1 })));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = CachedFileStore::new(dir.path());

        store.save("progress/alice", json!({ "done": 3 })).unwrap();
        assert_eq!(
            store.load("progress/alice").unwrap(),
            Some(json!({ "done": 3 }))
        );
        assert!(dir.path().join("progress/alice.json").exists());
    }

    #[test]
    fn test_save_visible_to_fresh_store() {
        let dir = TempDir::new().unwrap();
        {
            let store = CachedFileStore::new(dir.path());
            store.save("k", json!([1, 2, 3])).unwrap();
        }
        // A fresh instance has a cold cache and must hit the file.
        let store = CachedFileStore::new(dir.path());
        assert_eq!(store.load("k").unwrap(), Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_read_through_populates_cache() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("seed.json"), "{\"x\":1}").unwrap();

        let store = CachedFileStore::new(dir.path());
        assert_eq!(store.load("seed").unwrap(), Some(json!({ "x": 1 })));

        // Remove the backing file; the cached value must still be served.
        std::fs::remove_file(dir.path().join("seed.json")).unwrap();
        assert_eq!(store.load("seed").unwrap(), Some(json!({ "x": 1 })));
    }

    #[test]
    fn test_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = CachedFileStore::new(dir.path());
        assert!(store.load("nope").unwrap().is_none());
    }

    #[test]
    fn test_no_tmp_leftover() {
        let dir = TempDir::new().unwrap();
        let store = CachedFileStore::new(dir.path());
        store.save("k", json!(1)).unwrap();
        assert!(!dir.path().join("k.json.tmp").exists());
    }

    #[test]
    fn test_traversal_keys_rejected() {
        let dir = TempDir::new().unwrap();
        let store = CachedFileStore::new(dir.path());
        assert!(matches!(
            store.save("../escape", json!(1)),
            Err(CoreError::InvalidKey(_))
        ));
        assert!(matches!(
            store.load("/absolute"),
            Err(CoreError::InvalidKey(_))
        ));
    }
}
