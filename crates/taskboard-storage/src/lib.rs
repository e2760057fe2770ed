//! Durable client-side storage for the Taskboard session.
//!
//! This crate provides:
//! - **`KeyValueStorage`**: the storage backend trait
//! - **`FileStorage`**: a JSON file under `~/.taskboard`, survives restarts
//! - **`MemoryStorage`**: in-process map for tests and throwaway sessions
//! - **`SessionStore`**: the single-key token cell the request pipeline reads

mod file;
mod keys;
mod memory;
mod session_store;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use session_store::SessionStore;
pub use traits::KeyValueStorage;

use taskboard_config::Paths;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backing file is not a JSON object of strings
    #[error("Corrupt storage file {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create the default durable storage at `~/.taskboard/session.json`.
pub fn create_storage(paths: &Paths) -> StorageResult<Box<dyn KeyValueStorage>> {
    let storage = FileStorage::open(paths.session_file())?;
    Ok(Box::new(storage))
}

/// Create a `SessionStore` backed by the default durable storage.
pub fn create_session_store(paths: &Paths) -> StorageResult<SessionStore> {
    Ok(SessionStore::new(create_storage(paths)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_session_store_is_durable() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let store = create_session_store(&paths).unwrap();
        assert_eq!(store.get().unwrap(), None);
        store.set("T1").unwrap();
        drop(store);

        let reopened = create_session_store(&paths).unwrap();
        assert_eq!(reopened.get().unwrap(), Some("T1".to_string()));
    }
}
