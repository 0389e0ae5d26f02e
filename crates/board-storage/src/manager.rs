//! High-level API over the local and session stores.

use crate::{KeyValueStore, RoleHints, StorageError, StorageKeys, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Auth session persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl StoredSession {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Local (persistent) and session-scoped storage for one client.
#[derive(Clone)]
pub struct BoardStorage {
    local: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl BoardStorage {
    pub fn new(local: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self { local, session }
    }

    pub fn local(&self) -> &Arc<dyn KeyValueStore> {
        &self.local
    }

    pub fn session(&self) -> &Arc<dyn KeyValueStore> {
        &self.session
    }

    pub fn role_hints(&self) -> RoleHints {
        RoleHints::new(self.session.clone(), self.local.clone())
    }

    // ==========================================
    // Auth session
    // ==========================================

    pub fn save_session(&self, session: &StoredSession) -> StorageResult<()> {
        let json =
            serde_json::to_string(session).map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.local.set(StorageKeys::SESSION, &json)
    }

    pub fn load_session(&self) -> StorageResult<Option<StoredSession>> {
        match self.local.get(StorageKeys::SESSION)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| StorageError::Encoding(e.to_string())),
            None => Ok(None),
        }
    }

    pub fn clear_session(&self) -> StorageResult<()> {
        self.local.delete(StorageKeys::SESSION)?;
        Ok(())
    }

    /// Drop everything scoped to the signed-in session: tokens, the whole
    /// session store, and any role hints.
    pub fn clear_on_sign_out(&self) -> StorageResult<()> {
        self.clear_session()?;
        self.role_hints().clear()?;
        let removed = self.session.clear()?;
        debug!(removed, "Cleared session-scoped storage");
        Ok(())
    }

    // ==========================================
    // Draft profiles
    // ==========================================

    /// Save an unsubmitted profile form for `user_id`.
    pub fn save_draft_profile<T: Serialize>(&self, user_id: &str, draft: &T) -> StorageResult<()> {
        let json =
            serde_json::to_string(draft).map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.local.set(&StorageKeys::draft_profile(user_id), &json)
    }

    /// Load a saved draft. A draft that no longer decodes is discarded.
    pub fn load_draft_profile<T: for<'de> Deserialize<'de>>(
        &self,
        user_id: &str,
    ) -> StorageResult<Option<T>> {
        let key = StorageKeys::draft_profile(user_id);
        let Some(json) = self.local.get(&key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&json) {
            Ok(draft) => Ok(Some(draft)),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Discarding undecodable profile draft");
                self.local.delete(&key)?;
                Ok(None)
            }
        }
    }

    pub fn delete_draft_profile(&self, user_id: &str) -> StorageResult<bool> {
        self.local.delete(&StorageKeys::draft_profile(user_id))
    }

    // ==========================================
    // Startup maintenance
    // ==========================================

    /// Remove keys left behind by demo builds. Runs once per store; later
    /// calls return 0.
    pub fn purge_stale_demo_keys(&self) -> StorageResult<usize> {
        if self.local.has(StorageKeys::DEMO_PURGE_MARKER)? {
            return Ok(0);
        }

        let mut removed = 0;
        for key in StorageKeys::STALE_DEMO_KEYS {
            for store in [self.local.as_ref(), self.session.as_ref()] {
                if store.delete(key)? {
                    removed += 1;
                }
            }
        }

        self.local
            .set(StorageKeys::DEMO_PURGE_MARKER, &Utc::now().to_rfc3339())?;
        info!(removed, "Purged stale demo storage keys");
        Ok(removed)
    }
}
