//! Key-value persistence for agent state records.
//!
//! Every key has exactly one writer (the owning agent) and any number of
//! readers. No locks are taken: writers replace whole records atomically, so
//! a reader sees either the old or the new record, never a torn one.

mod paths;

pub use paths::BatonPaths;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid record key {0:?}")]
    InvalidKey(String),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Persistence seam for the coordination core.
pub trait StateStore: Send + Sync {
    /// Raw bytes stored under `key`, or `None` if nothing was ever written.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the record under `key`. Readers never observe a partial write.
    fn put(&self, key: &str, data: &[u8]) -> Result<(), StoreError>;
}

/// Keys become file names, so keep them to a safe alphabet.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

// ── Filesystem ──

/// One JSON file per key under a directory: `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStore for FsStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_key(key)?;
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        let path = self.path_for(key);
        write_atomic(&path, data).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::trace!(path = %path.display(), bytes = data.len(), "record written");
        Ok(())
    }
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no parent dir for {}", path.display()),
        )
    })?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

// ── In-memory ──

/// Process-local store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_key(key)?;
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(key).cloned())
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.insert(key.to_string(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("test.json");
        write_atomic(&path, b"hello world").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello world");
    }

    #[test]
    fn write_atomic_replaces_and_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.json");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().flatten().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn fs_store_missing_key_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsStore::new(tmp.path());
        assert!(store.get("cursor").unwrap().is_none());
    }

    #[test]
    fn fs_store_put_then_get() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsStore::new(tmp.path().join("agent-states"));
        store.put("cursor", br#"{"a":1}"#).unwrap();
        assert_eq!(store.get("cursor").unwrap().unwrap(), br#"{"a":1}"#);
        assert!(tmp.path().join("agent-states/cursor.json").is_file());
    }

    #[test]
    fn rejects_path_like_keys() {
        let store = MemoryStore::new();
        for bad in ["", "../x", "a/b", ".hidden", "a b"] {
            assert!(
                matches!(store.put(bad, b"x"), Err(StoreError::InvalidKey(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(store.put("unified-view", b"x").is_ok());
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryStore::new();
        store.put("k", b"1").unwrap();
        store.put("k", b"2").unwrap();
        assert_eq!(store.get("k").unwrap().unwrap(), b"2");
        assert_eq!(store.keys(), vec!["k".to_string()]);
    }

    #[test]
    fn fs_store_read_error_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsStore::new(tmp.path());
        // A directory where the record file should be cannot be read as a file.
        fs::create_dir_all(store.path_for("cursor")).unwrap();
        assert!(matches!(store.get("cursor"), Err(StoreError::Io { .. })));
    }
}
