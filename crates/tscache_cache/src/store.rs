//! Cache entry storage.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::key::cache_key;

/// Where cache entries live.
///
/// The default [`JsonFileStore`] keeps one JSON file per key. Hosts with
/// their own storage provide another implementation to the loader.
pub trait CacheStore: Send + Sync {
    /// Maps a request string to the key its entry is stored under.
    fn cache_key(&self, request: &str) -> String;

    /// Reads the entry stored under `key`. A missing entry is `Ok(None)`.
    fn read(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Stores `entry` under `key`, replacing any previous entry.
    fn write(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError>;
}

/// Stores each entry as `<directory>/<hex digest>.json`.
pub struct JsonFileStore {
    identifier: String,
    directory: PathBuf,
    /// Directories already known to exist.
    created: Mutex<HashSet<PathBuf>>,
}

impl JsonFileStore {
    /// Creates a store for `identifier` rooted at `directory`.
    ///
    /// The directory is created on the first write.
    pub fn new(identifier: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            identifier: identifier.into(),
            directory: directory.into(),
            created: Mutex::new(HashSet::new()),
        }
    }

    /// The cache directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The file an entry with `key` is stored in.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }

    fn ensure_dir(&self, dir: &Path) -> Result<(), CacheError> {
        let mut created = self.created.lock();
        if created.contains(dir) {
            return Ok(());
        }
        std::fs::create_dir_all(dir).map_err(|e| CacheError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        created.insert(dir.to_path_buf());
        Ok(())
    }
}

impl CacheStore for JsonFileStore {
    fn cache_key(&self, request: &str) -> String {
        cache_key(&self.identifier, request).to_string()
    }

    fn read(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io { path, source: e }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CacheError::Parse {
                path,
                reason: e.to_string(),
            })
    }

    fn write(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        self.ensure_dir(&self.directory)?;
        let json = serde_json::to_string(entry).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

        // Readers never observe a half-written entry.
        let path = self.entry_path(key);
        let staging = self.directory.join(format!("{key}.json.tmp"));
        std::fs::write(&staging, json).map_err(|e| CacheError::Io {
            path: staging.clone(),
            source: e,
        })?;
        std::fs::rename(&staging, &path).map_err(|e| CacheError::Io { path, source: e })
    }
}
