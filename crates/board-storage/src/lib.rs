//! Client-side key/value storage.
//!
//! Two scopes mirror what a browser offers:
//! - **local**: persistent across runs ([`FileStore`] at `storage/local.json`)
//! - **session**: dropped on sign-out ([`FileStore`] at `storage/session.json`)
//!
//! Both are last-write-wins and are only used for low-stakes hints: role
//! choice during sign-up, draft profile forms, and the auth session.

mod file;
mod keys;
mod manager;
mod memory;
mod role_hints;
mod traits;

pub use file::FileStore;
pub use keys::StorageKeys;
pub use manager::{BoardStorage, StoredSession};
pub use memory::MemoryStore;
pub use role_hints::{RoleHintSource, RoleHints};
pub use traits::KeyValueStore;

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Open file-backed local and session stores.
pub fn open_file_storage(local: &Path, session: &Path) -> StorageResult<BoardStorage> {
    Ok(BoardStorage::new(
        Arc::new(FileStore::open(local)?),
        Arc::new(FileStore::open(session)?),
    ))
}

/// Storage that lives only as long as the process.
pub fn in_memory_storage() -> BoardStorage {
    BoardStorage::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_basics() {
        let store = MemoryStore::new();

        store.set("test_key", "test_value").unwrap();
        assert_eq!(store.get("test_key").unwrap(), Some("test_value".to_string()));
        assert!(store.has("test_key").unwrap());
        assert!(!store.has("nonexistent").unwrap());

        store.set("test_other", "x").unwrap();
        assert_eq!(store.keys_with_prefix("test_").unwrap().len(), 2);

        assert!(store.delete("test_key").unwrap());
        assert!(!store.delete("test_key").unwrap());
        assert_eq!(store.clear().unwrap(), 1);
    }

    #[test]
    fn test_open_file_storage_uses_separate_files() {
        let dir = tempdir().unwrap();
        let storage = open_file_storage(
            &dir.path().join("local.json"),
            &dir.path().join("session.json"),
        )
        .unwrap();

        storage.local().set("k", "local").unwrap();
        storage.session().set("k", "session").unwrap();

        assert_eq!(storage.local().get("k").unwrap(), Some("local".to_string()));
        assert_eq!(storage.session().get("k").unwrap(), Some("session".to_string()));
    }
}
