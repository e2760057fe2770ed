//! The session token cell.

use crate::{KeyValueStorage, StorageKeys, StorageResult};

/// Holds the current bearer token under a single well-known key.
///
/// No expiry logic of its own. Every method is synchronous.
pub struct SessionStore {
    storage: Box<dyn KeyValueStorage>,
}

impl SessionStore {
    /// Create a session store over the given storage backend.
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Current token, if any. An empty stored string reads as absent.
    pub fn get(&self) -> StorageResult<Option<String>> {
        Ok(self
            .storage
            .get(StorageKeys::TOKEN)?
            .filter(|token| !token.is_empty()))
    }

    /// Replace the stored token.
    pub fn set(&self, token: &str) -> StorageResult<()> {
        self.storage.set(StorageKeys::TOKEN, token)
    }

    /// Remove the token. Clearing an empty store succeeds.
    pub fn clear(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::TOKEN)?;
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
