//! Persistence Module
//!
//! Best-effort mirroring of store entries into a durable key-value medium.
//!
//! The in-memory store stays authoritative: every failure here is logged and
//! swallowed, and a store with zero persisted entries behaves normally.
//!
//! # Layout
//! Each entry lives under `"lotto_cache:{namespace}:{cache_key}"` as a JSON
//! [`PersistedEntry`]. Records with an unknown `version` are dropped on load.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

// == Public Constants ==
/// Leading segment of every durable key.
pub const KEY_PREFIX: &str = "lotto_cache";

/// Format tag written into every record.
pub const FORMAT_VERSION: u32 = 1;

// == Backend Trait ==
/// A durable string-to-string medium, such as a directory or a browser-like
/// local storage area.
pub trait PersistenceBackend: Send + Sync + Debug {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    /// Lists every key currently held.
    fn keys(&self) -> Result<Vec<String>>;
}

// == Memory Backend ==
/// In-process backend. Clones share storage, which lets tests rebuild a
/// store against the same medium to simulate a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    items: Arc<Mutex<BTreeMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that refuses new keys once it holds `max_items`.
    pub fn with_quota(max_items: usize) -> Self {
        Self {
            items: Arc::default(),
            quota: Some(max_items),
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl PersistenceBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.lock();
        if let Some(max) = self.quota {
            if !items.contains_key(key) && items.len() >= max {
                return Err(CacheError::Storage(format!(
                    "quota of {} items exceeded",
                    max
                )));
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.items.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.lock().keys().cloned().collect())
    }
}

// == File Backend ==
/// One JSON file per key inside a directory. File names are the hex-encoded
/// key so any key string is a valid name.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Opens (creating if needed) the backing directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(key)))
    }
}

impl PersistenceBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for item in fs::read_dir(&self.dir)? {
            let path = item?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let decoded = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| hex::decode(s).ok())
                .and_then(|bytes| String::from_utf8(bytes).ok());
            // Foreign files in the directory are ignored
            if let Some(key) = decoded {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

// == Persisted Entry ==
/// Serialized shape of an entry in the durable medium.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedEntry<T> {
    pub version: u32,
    pub data: T,
    pub created_at: u64,
    pub expires_at: u64,
    pub access_count: u64,
    pub last_accessed_at: u64,
}

impl<T> PersistedEntry<T> {
    fn into_entry(self) -> CacheEntry<T> {
        CacheEntry {
            data: self.data,
            created_at: self.created_at,
            expires_at: self.expires_at,
            access_count: self.access_count,
            last_accessed_at: self.last_accessed_at,
            sequence: 0,
        }
    }
}

// == Persistence Adapter ==
/// Mirrors one store into a backend under a namespaced prefix.
#[derive(Debug, Clone)]
pub struct Persistence {
    backend: Arc<dyn PersistenceBackend>,
    prefix: String,
}

impl Persistence {
    pub fn new(backend: Arc<dyn PersistenceBackend>, namespace: &str) -> Self {
        Self {
            backend,
            prefix: format!("{}:{}:", KEY_PREFIX, namespace),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    // == Save ==
    /// Writes an entry. Failures are logged, never returned.
    pub fn save<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) {
        let record = PersistedEntry {
            version: FORMAT_VERSION,
            data: &entry.data,
            created_at: entry.created_at,
            expires_at: entry.expires_at,
            access_count: entry.access_count,
            last_accessed_at: entry.last_accessed_at,
        };
        let result = serde_json::to_string(&record)
            .map_err(CacheError::from)
            .and_then(|json| self.backend.write(&self.storage_key(key), &json));
        if let Err(e) = result {
            warn!(key, prefix = %self.prefix, error = %e, "Failed to persist cache entry");
        }
    }

    // == Remove ==
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.backend.remove(&self.storage_key(key)) {
            warn!(key, prefix = %self.prefix, error = %e, "Failed to remove persisted entry");
        }
    }

    // == Clear ==
    /// Removes every persisted key under this prefix.
    pub fn clear(&self) {
        for storage_key in self.owned_keys() {
            if let Err(e) = self.backend.remove(&storage_key) {
                warn!(key = %storage_key, error = %e, "Failed to remove persisted entry");
            }
        }
    }

    // == Load ==
    /// Reads back every live entry under this prefix, oldest first.
    ///
    /// Expired, corrupt and unknown-version records are deleted from the
    /// medium and skipped; one bad record never stops the rest from loading.
    pub fn load<T: DeserializeOwned>(&self, now_ms: u64) -> Vec<(String, CacheEntry<T>)> {
        let mut loaded = Vec::new();
        let mut dropped = 0usize;

        for storage_key in self.owned_keys() {
            let key = storage_key[self.prefix.len()..].to_string();
            let raw = match self.backend.read(&storage_key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    warn!(key = %storage_key, error = %e, "Failed to read persisted entry");
                    continue;
                }
            };

            match decode::<T>(&raw) {
                Ok(entry) if !entry.is_expired(now_ms) => loaded.push((key, entry)),
                Ok(_) => {
                    dropped += 1;
                    self.remove(&key);
                }
                Err(e) => {
                    warn!(key = %storage_key, error = %e, "Discarding unreadable persisted entry");
                    dropped += 1;
                    self.remove(&key);
                }
            }
        }

        loaded.sort_by_key(|(_, entry)| entry.created_at);
        debug!(
            prefix = %self.prefix,
            loaded = loaded.len(),
            dropped,
            "Loaded persisted entries"
        );
        loaded
    }

    fn owned_keys(&self) -> Vec<String> {
        match self.backend.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(&self.prefix))
                .collect(),
            Err(e) => {
                warn!(prefix = %self.prefix, error = %e, "Failed to list persisted entries");
                Vec::new()
            }
        }
    }
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<CacheEntry<T>> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let version = value.get("version").and_then(|v| v.as_u64());
    if version != Some(FORMAT_VERSION as u64) {
        return Err(CacheError::Storage(format!(
            "unsupported record version {:?}",
            version
        )));
    }
    let record: PersistedEntry<T> = serde_json::from_value(value)?;
    Ok(record.into_entry())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(backend: &MemoryBackend) -> Persistence {
        Persistence::new(Arc::new(backend.clone()), "sales")
    }

    #[test]
    fn test_prefix_layout() {
        let backend = MemoryBackend::new();
        let p = adapter(&backend);

        p.save("sales:daily:2025-08-14", &CacheEntry::new(12u32, 0, 1_000));

        assert_eq!(p.prefix(), "lotto_cache:sales:");
        let keys = backend.keys().unwrap();
        assert_eq!(keys, vec!["lotto_cache:sales:sales:daily:2025-08-14".to_string()]);
    }

    #[test]
    fn test_record_shape() {
        let backend = MemoryBackend::new();
        adapter(&backend).save("k", &CacheEntry::new("v".to_string(), 10, 50));

        let raw = backend.read("lotto_cache:sales:k").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["data"], "v");
        assert_eq!(json["created_at"], 10);
        assert_eq!(json["expires_at"], 60);
        assert_eq!(json["access_count"], 1);
        assert_eq!(json["last_accessed_at"], 10);
    }

    #[test]
    fn test_load_skips_and_removes_expired() {
        let backend = MemoryBackend::new();
        let p = adapter(&backend);
        p.save("live", &CacheEntry::new(1u32, 0, 10_000));
        p.save("dead", &CacheEntry::new(2u32, 0, 100));

        let loaded: Vec<(String, CacheEntry<u32>)> = p.load(5_000);

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, "live");
        assert_eq!(loaded[0].1.data, 1);
        assert!(backend.read("lotto_cache:sales:dead").unwrap().is_none());
    }

    #[test]
    fn test_load_skips_corrupt_and_unknown_version() {
        let backend = MemoryBackend::new();
        let p = adapter(&backend);
        p.save("good", &CacheEntry::new(1u32, 0, 10_000));
        backend.write("lotto_cache:sales:garbage", "{not json").unwrap();
        backend
            .write(
                "lotto_cache:sales:future",
                r#"{"version":2,"data":1,"created_at":0,"expires_at":99999,"access_count":1,"last_accessed_at":0}"#,
            )
            .unwrap();

        let loaded: Vec<(String, CacheEntry<u32>)> = p.load(0);

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, "good");
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_load_ignores_other_namespaces() {
        let backend = MemoryBackend::new();
        let sales = adapter(&backend);
        let finances = Persistence::new(Arc::new(backend.clone()), "finances");
        sales.save("a", &CacheEntry::new(1u32, 0, 10_000));
        finances.save("b", &CacheEntry::new(2u32, 0, 10_000));

        let loaded: Vec<(String, CacheEntry<u32>)> = finances.load(0);

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, "b");
    }

    #[test]
    fn test_clear_only_touches_own_prefix() {
        let backend = MemoryBackend::new();
        let sales = adapter(&backend);
        let finances = Persistence::new(Arc::new(backend.clone()), "finances");
        sales.save("a", &CacheEntry::new(1u32, 0, 10_000));
        finances.save("b", &CacheEntry::new(2u32, 0, 10_000));

        sales.clear();

        assert_eq!(backend.keys().unwrap(), vec!["lotto_cache:finances:b".to_string()]);
    }

    #[test]
    fn test_quota_failure_is_swallowed() {
        let backend = MemoryBackend::with_quota(1);
        let p = adapter(&backend);

        p.save("a", &CacheEntry::new(1u32, 0, 10_000));
        p.save("b", &CacheEntry::new(2u32, 0, 10_000));

        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();

        backend.write("lotto_cache:sales:a/b c", "payload").unwrap();

        assert_eq!(
            backend.read("lotto_cache:sales:a/b c").unwrap().as_deref(),
            Some("payload")
        );
        assert_eq!(backend.keys().unwrap(), vec!["lotto_cache:sales:a/b c".to_string()]);

        backend.remove("lotto_cache:sales:a/b c").unwrap();
        assert!(backend.read("lotto_cache:sales:a/b c").unwrap().is_none());
        // Removing twice is fine
        backend.remove("lotto_cache:sales:a/b c").unwrap();
    }

    #[test]
    fn test_file_backend_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.txt"), "hi").unwrap();
        fs::write(dir.path().join("zz-not-hex.json"), "{}").unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();

        assert!(backend.keys().unwrap().is_empty());
    }
}
