//! File system paths for the client.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Directory name under the home directory.
const BASE_DIR_NAME: &str = ".taskboard";

/// Manages file system paths for the client.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for client files (~/.taskboard)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.taskboard`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.taskboard).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.taskboard/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the session storage file path (~/.taskboard/session.json).
    pub fn session_file(&self) -> PathBuf {
        self.base_dir.join("session.json")
    }

    /// Get the logs directory (~/.taskboard/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the structured log file path (~/.taskboard/logs/client.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("client.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_with_base_dir() {
        let paths = Paths::with_base_dir(PathBuf::from("/tmp/taskboard-test"));
        assert_eq!(paths.base_dir(), &PathBuf::from("/tmp/taskboard-test"));
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/tmp/taskboard-test/config.json")
        );
        assert_eq!(
            paths.session_file(),
            PathBuf::from("/tmp/taskboard-test/session.json")
        );
        assert_eq!(
            paths.log_file(),
            PathBuf::from("/tmp/taskboard-test/logs/client.jsonl")
        );
    }

    #[test]
    fn test_ensure_dirs_creates_tree() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("nested"));

        paths.ensure_dirs().unwrap();
        assert!(paths.base_dir().is_dir());
        assert!(paths.logs_dir().is_dir());

        // Idempotent
        paths.ensure_dirs().unwrap();
    }

    #[test]
    fn test_default_paths_live_under_home() {
        if let Ok(paths) = Paths::new() {
            assert!(paths.base_dir().ends_with(BASE_DIR_NAME));
        }
    }
}
