//! File-backed storage: one JSON object of string values.

use crate::{KeyValueStorage, StorageError, StorageResult};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Durable storage in a single JSON file.
///
/// The file is re-read on every `get` so values written by another process
/// are visible. Writes replace the file atomically.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Open storage at `path`, creating the parent directory if needed.
    /// The file itself is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> StorageResult<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(self.corrupt("expected a JSON object")),
            Err(e) => Err(self.corrupt(&e.to_string())),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;

        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("storage");
        let tmp_path = self.path.with_file_name(format!(
            ".{}.tmp.{}",
            file_name,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));

        let result = (|| -> io::Result<()> {
            let mut options = fs::OpenOptions::new();
            options.write(true).create_new(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options.open(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn corrupt(&self, reason: &str) -> StorageError {
        StorageError::Corrupt {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_map()?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_map(&map)?;
        debug!(key, path = %self.path.display(), "Stored value");
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let map = self.read_map()?;
        match map.get(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => {
                warn!(key, "Stored value is not a string, ignoring");
                Ok(None)
            }
        }
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let _guard = self.write_lock.lock();
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StorageError::Corrupt { reason, .. }) => {
                // Unreadable contents cannot hold a usable value; start over.
                warn!(path = %self.path.display(), %reason, "Resetting corrupt storage file");
                self.write_map(&Map::new())?;
                return Ok(true);
            }
            Err(e) => return Err(e),
        };

        if map.remove(key).is_none() {
            return Ok(false);
        }
        self.write_map(&map)?;
        debug!(key, path = %self.path.display(), "Deleted value");
        Ok(true)
    }
}
