use crate::errors::StorageError;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::error;

pub const PROJECTS_KEY: &str = "tap_counter.projects.v2";
pub const LEGACY_PROJECTS_KEY: &str = "tap_counter.projects.v1";
pub const LEGACY_COUNT_KEY: &str = "tap_counter.count";
pub const RECENT_NAMES_KEY: &str = "tap_counter.recent_names";
pub const STATS_START_KEY: &str = "tap_counter.stats_start";

pub const ALL_KEYS: [&str; 5] = [
    PROJECTS_KEY,
    LEGACY_PROJECTS_KEY,
    LEGACY_COUNT_KEY,
    RECENT_NAMES_KEY,
    STATS_START_KEY,
];

/// Synchronous string key-value storage backing the project store.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// All keys live in one JSON object on disk. Reads are served from the copy
/// loaded at open; every write rewrites the file through a temp file and rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Blocking write. Callers run it under the store mutex, one small file at
    // a time, so it stays off `tokio::fs`.
    fn flush(&self) -> Result<(), StorageError> {
        let payload = serde_json::to_vec_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

fn load_entries(path: &Path) -> BTreeMap<String, String> {
    match fs::read(path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(err) => {
                error!("failed to parse data file {}: {err}", path.display());
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            error!("failed to read data file {}: {err}", path.display());
            BTreeMap::new()
        }
    }
}
