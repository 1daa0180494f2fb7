use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::repository::{KeyValueStore, StorageError};

/// Key-value store persisted as a single JSON object on disk.
///
/// The whole map is held in memory; every write rewrites the file through a
/// sibling temp file and a rename so a crash never leaves a half-written file.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store. A file that is not a JSON object is
    /// logged and treated as empty; entries whose value is not a string are
    /// dropped one by one. Either way the file is replaced on the next write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the parent directory cannot be created or
    /// the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let entries = match fs::read(&path) {
            Ok(raw) => parse_entries(&path, &raw),
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened store file");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(entries)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn parse_entries(path: &Path, raw: &[u8]) -> BTreeMap<String, String> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return BTreeMap::new();
    }

    let object = match serde_json::from_slice::<Map<String, Value>>(raw) {
        Ok(object) => object,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "store file is not a JSON object; starting empty"
            );
            return BTreeMap::new();
        }
    };

    object
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(value) => Some((key, value)),
            other => {
                tracing::warn!(
                    path = %path.display(),
                    key = %key,
                    kind = json_kind(&other),
                    "dropping non-string store entry"
                );
                None
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        let previous = guard.insert(key.to_owned(), value.to_owned());
        if let Err(err) = self.flush(&guard) {
            // Keep memory in step with disk.
            match previous {
                Some(old) => guard.insert(key.to_owned(), old),
                None => guard.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        let Some(previous) = guard.remove(key) else {
            return Ok(());
        };
        if let Err(err) = self.flush(&guard) {
            guard.insert(key.to_owned(), previous);
            return Err(err);
        }
        Ok(())
    }
}
