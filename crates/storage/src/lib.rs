//! Durable key-value persistence for the ledger.
//!
//! Mirrors the shape of browser localStorage: flat string keys, string
//! values, synchronous writes. `FileStore` keeps the whole map in one JSON
//! file and rewrites it on every `set`; data volumes are a handful of
//! records per month, so write amplification is a non-issue.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

/// Synchronous string key-value store.
///
/// Reads never fail: a missing key is simply `None`, and implementations
/// must swallow corrupt backing data at load time rather than surface it.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    /// Persists before returning.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Wipes every key, including ones the caller never wrote.
    fn clear(&mut self) -> Result<()>;
}

impl<T: KvStore + ?Sized> KvStore for &mut T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}

/// File-backed implementation: one JSON object, string values only.
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`. A missing file starts empty; a file that
    /// fails to parse is treated as empty too (read-defaulting, never an
    /// error) and will be overwritten on the next write.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => parse_entries(&raw),
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Creating store dir: {}", parent.display()))?;
            }
        }
        let mut map = Map::new();
        let mut keys: Vec<&String> = self.entries.keys().collect();
        keys.sort();
        for k in keys {
            map.insert(k.clone(), Value::String(self.entries[k].clone()));
        }
        let json = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write(&self.path, json)
            .with_context(|| format!("Writing store file: {}", self.path.display()))?;
        Ok(())
    }
}

fn parse_entries(raw: &str) -> HashMap<String, String> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) else {
        return HashMap::new();
    };
    map.into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k, s)),
            _ => None,
        })
        .collect()
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.flush()
    }
}

/// In-memory implementation for tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
