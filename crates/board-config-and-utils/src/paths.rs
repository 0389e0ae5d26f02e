//! File system locations for client state.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Resolves where the client keeps config, logs, and local storage.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory (~/.teacherboard)
    base_dir: PathBuf,
}

impl Paths {
    /// Use `~/.teacherboard` as the base directory.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".teacherboard"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// `<base>/config.json`
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// `<base>/storage`
    pub fn storage_dir(&self) -> PathBuf {
        self.base_dir.join("storage")
    }

    /// Persistent key/value store (`<base>/storage/local.json`).
    pub fn local_storage_file(&self) -> PathBuf {
        self.storage_dir().join("local.json")
    }

    /// Session-scoped key/value store (`<base>/storage/session.json`).
    /// Removed on sign-out.
    pub fn session_storage_file(&self) -> PathBuf {
        self.storage_dir().join("session.json")
    }

    /// `<base>/logs`
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// `<base>/logs/dev.jsonl`
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("dev.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.storage_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
