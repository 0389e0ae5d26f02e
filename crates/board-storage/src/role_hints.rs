//! Role hints carried across the sign-up redirect.
//!
//! A user picks "teacher" or "school" before authenticating; the choice has to
//! survive the round trip to the auth provider. Sources are consulted in a
//! fixed order and the first valid value wins:
//!
//! 1. the `role` query parameter on the callback URL
//! 2. session-scoped storage
//! 3. persistent local storage
//!
//! Each store holds the hint under a single key ([`StorageKeys::ROLE_HINT`]).
//! Older key names are read as a migration chain and folded into it.

use crate::{KeyValueStore, StorageKeys, StorageResult};
use board_types::Role;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a resolved role hint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleHintSource {
    UrlParam,
    SessionStorage,
    LocalStorage,
}

#[derive(Clone)]
pub struct RoleHints {
    session: Arc<dyn KeyValueStore>,
    local: Arc<dyn KeyValueStore>,
}

impl RoleHints {
    pub fn new(session: Arc<dyn KeyValueStore>, local: Arc<dyn KeyValueStore>) -> Self {
        Self { session, local }
    }

    /// Persist a confirmed role choice in both scopes.
    pub fn remember(&self, role: Role) -> StorageResult<()> {
        self.session.set(StorageKeys::ROLE_HINT, role.as_str())?;
        self.local.set(StorageKeys::ROLE_HINT, role.as_str())?;
        debug!(%role, "Stored role hint");
        Ok(())
    }

    /// Resolve the highest-priority valid hint.
    pub fn resolve(&self, url_param: Option<&str>) -> StorageResult<Option<(Role, RoleHintSource)>> {
        if let Some(raw) = url_param {
            match raw.parse::<Role>() {
                Ok(role) => return Ok(Some((role, RoleHintSource::UrlParam))),
                Err(e) => warn!(error = %e, "Ignoring invalid role query parameter"),
            }
        }

        if let Some(role) = Self::read_store(self.session.as_ref())? {
            return Ok(Some((role, RoleHintSource::SessionStorage)));
        }

        if let Some(role) = Self::read_store(self.local.as_ref())? {
            return Ok(Some((role, RoleHintSource::LocalStorage)));
        }

        Ok(None)
    }

    /// Remove the hint and every legacy key from both scopes.
    pub fn clear(&self) -> StorageResult<()> {
        for store in [self.session.as_ref(), self.local.as_ref()] {
            store.delete(StorageKeys::ROLE_HINT)?;
            for key in StorageKeys::LEGACY_ROLE_HINTS {
                store.delete(key)?;
            }
        }
        debug!("Cleared role hints");
        Ok(())
    }

    /// Canonical key first, then the legacy chain. A legacy hit is moved to the
    /// canonical key so later reads take the short path.
    fn read_store(store: &dyn KeyValueStore) -> StorageResult<Option<Role>> {
        if let Some(raw) = store.get(StorageKeys::ROLE_HINT)? {
            match raw.parse::<Role>() {
                Ok(role) => return Ok(Some(role)),
                Err(e) => {
                    warn!(error = %e, "Dropping invalid stored role hint");
                    store.delete(StorageKeys::ROLE_HINT)?;
                }
            }
        }

        for key in StorageKeys::LEGACY_ROLE_HINTS {
            let Some(raw) = store.get(key)? else {
                continue;
            };
            store.delete(key)?;
            match raw.parse::<Role>() {
                Ok(role) => {
                    debug!(legacy_key = key, %role, "Migrating legacy role hint");
                    store.set(StorageKeys::ROLE_HINT, role.as_str())?;
                    return Ok(Some(role));
                }
                Err(e) => warn!(legacy_key = key, error = %e, "Dropping invalid legacy role hint"),
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn hints() -> (RoleHints, Arc<MemoryStore>, Arc<MemoryStore>) {
        let session = Arc::new(MemoryStore::new());
        let local = Arc::new(MemoryStore::new());
        (
            RoleHints::new(session.clone(), local.clone()),
            session,
            local,
        )
    }

    #[test]
    fn url_param_wins_over_storage() {
        let (hints, _, _) = hints();
        hints.remember(Role::Teacher).unwrap();

        let resolved = hints.resolve(Some("school")).unwrap();
        assert_eq!(resolved, Some((Role::School, RoleHintSource::UrlParam)));
    }

    #[test]
    fn session_wins_over_local() {
        let (hints, session, local) = hints();
        session.set(StorageKeys::ROLE_HINT, "school").unwrap();
        local.set(StorageKeys::ROLE_HINT, "teacher").unwrap();

        let resolved = hints.resolve(None).unwrap();
        assert_eq!(resolved, Some((Role::School, RoleHintSource::SessionStorage)));
    }

    #[test]
    fn invalid_url_param_falls_through() {
        let (hints, _, local) = hints();
        local.set(StorageKeys::ROLE_HINT, "teacher").unwrap();

        let resolved = hints.resolve(Some("principal")).unwrap();
        assert_eq!(resolved, Some((Role::Teacher, RoleHintSource::LocalStorage)));
    }

    #[test]
    fn legacy_key_is_migrated() {
        let (hints, _, local) = hints();
        local.set("oauth_role", "school").unwrap();

        let resolved = hints.resolve(None).unwrap();
        assert_eq!(resolved, Some((Role::School, RoleHintSource::LocalStorage)));
        assert_eq!(local.get("oauth_role").unwrap(), None);
        assert_eq!(
            local.get(StorageKeys::ROLE_HINT).unwrap(),
            Some("school".to_string())
        );
    }

    #[test]
    fn nothing_stored_resolves_to_none() {
        let (hints, _, _) = hints();
        assert_eq!(hints.resolve(None).unwrap(), None);
    }

    #[test]
    fn clear_removes_canonical_and_legacy_keys() {
        let (hints, session, local) = hints();
        hints.remember(Role::Teacher).unwrap();
        session.set("pendingRole", "teacher").unwrap();
        local.set("userRole", "school").unwrap();

        hints.clear().unwrap();

        assert!(session.keys().unwrap().is_empty());
        assert!(local.keys().unwrap().is_empty());
        assert_eq!(hints.resolve(None).unwrap(), None);
    }
}
