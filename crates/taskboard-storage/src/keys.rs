//! Storage key constants.

/// Storage keys used by the client
pub struct StorageKeys;

impl StorageKeys {
    /// Bearer token for the current session
    pub const TOKEN: &'static str = "token";
}
