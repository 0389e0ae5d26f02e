//! Session/identity store.
//!
//! Turns auth events into an [`Identity`] by reading (or, on first sign-in,
//! creating) the user's profile. The role comes from the profile row and is
//! never changed afterwards; role hints only matter when no profile exists.

use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionState};
use crate::{SessionError, SessionResult};
use board_storage::{BoardStorage, RoleHintSource};
use board_types::{tables, AuthUser, Identity, Profile, Role};
use parking_lot::Mutex;
use remote_data_client::{decode_row, AuthEvent, RemoteDataService, RemoteError, Select};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of handling one auth event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Ready(Identity),
    /// Signed in without a profile or a usable role hint.
    RoleSelectionRequired { user: AuthUser },
    /// Signed in, but the profile lookup failed. Treated as no identity.
    Anonymous,
    SignedOut,
}

pub struct SessionStore {
    remote: Arc<dyn RemoteDataService>,
    storage: BoardStorage,
    fsm: Mutex<SessionMachine>,
    identity: watch::Sender<Option<Identity>>,
    pending_user: Mutex<Option<AuthUser>>,
    /// Auth events are resolved one at a time, in arrival order.
    resolving: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state())
            .field("identity", &self.current_identity())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(remote: Arc<dyn RemoteDataService>, storage: BoardStorage) -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            remote,
            storage,
            fsm: Mutex::new(SessionMachine::new()),
            identity,
            pending_user: Mutex::new(None),
            resolving: tokio::sync::Mutex::new(()),
        }
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    /// Receiver that observes every identity change.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    pub fn state(&self) -> SessionState {
        SessionState::from(self.fsm.lock().state())
    }

    /// The signed-in user waiting on [`SessionStore::complete_role_selection`].
    pub fn pending_user(&self) -> Option<AuthUser> {
        self.pending_user.lock().clone()
    }

    fn transition(&self, input: &SessionMachineInput) -> SessionResult<SessionState> {
        let mut fsm = self.fsm.lock();
        let old_state = SessionState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            SessionError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = SessionState::from(fsm.state());
        drop(fsm);

        if old_state != new_state {
            debug!(?old_state, ?new_state, "Session state transition");
        }
        Ok(new_state)
    }

    fn publish(&self, identity: Option<Identity>) {
        self.identity.send_replace(identity);
    }

    /// Resolve the identity for one auth event.
    pub async fn handle_auth_event(&self, event: AuthEvent) -> SessionResult<SessionOutcome> {
        let _guard = self.resolving.lock().await;
        match event {
            AuthEvent::SignedIn {
                user,
                redirect_role,
            } => self.resolve(user, redirect_role.as_deref()).await,
            AuthEvent::TokenRefreshed { user } => self.resolve(user, None).await,
            AuthEvent::SignedOut => self.sign_out_local(),
        }
    }

    /// Pick up a session that already existed before events were observed.
    pub async fn bootstrap(&self) -> SessionResult<SessionOutcome> {
        match self.remote.current_user() {
            Some(user) => {
                self.handle_auth_event(AuthEvent::SignedIn {
                    user,
                    redirect_role: None,
                })
                .await
            }
            None => Ok(SessionOutcome::SignedOut),
        }
    }

    /// Process auth events until the sender goes away.
    pub async fn run(&self, mut events: broadcast::Receiver<AuthEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(e) = self.handle_auth_event(event).await {
                        warn!(error = %e, "Failed to handle auth event");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Auth event receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Auth event stream closed");
                    break;
                }
            }
        }
    }

    /// Subscribe to the remote service's auth events and process them on a
    /// background task.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let events = self.remote.auth_events();
        let store = self.clone();
        tokio::spawn(async move { store.run(events).await })
    }

    /// Persist a role chosen before sign-up so it survives the auth redirect.
    pub fn remember_role_hint(&self, role: Role) -> SessionResult<()> {
        if !is_self_assignable(role) {
            return Err(SessionError::RoleNotSelectable(role));
        }
        self.storage.role_hints().remember(role)?;
        Ok(())
    }

    /// Create the profile for a user who had to pick a role.
    pub async fn complete_role_selection(&self, role: Role) -> SessionResult<Identity> {
        let _guard = self.resolving.lock().await;

        let Some(user) = self.pending_user() else {
            return Err(SessionError::NoPendingUser);
        };
        if !is_self_assignable(role) {
            return Err(SessionError::RoleNotSelectable(role));
        }

        self.transition(&SessionMachineInput::RoleChosen)?;

        // Another client may have finished sign-up in the meantime.
        let existing = match self.fetch_profile(&user.id).await {
            Ok(existing) => existing,
            Err(e) => {
                self.transition(&SessionMachineInput::RoleMissing)?;
                return Err(e.into());
            }
        };
        if let Some(existing) = existing {
            let identity = existing.identity();
            self.pending_user.lock().take();
            self.transition(&SessionMachineInput::ProfileFound)?;
            self.publish(Some(identity));
            return Err(SessionError::RoleAlreadyAssigned(existing.role()));
        }

        let identity = match self.create_profile(&user, role).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Profile creation failed, role choice still pending");
                self.transition(&SessionMachineInput::RoleMissing)?;
                return Err(e);
            }
        };
        self.pending_user.lock().take();
        self.clear_hints();
        self.transition(&SessionMachineInput::ProfileCreated)?;
        info!(user_id = %identity.id, role = %identity.role, "Role selected");
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn resolve(
        &self,
        user: AuthUser,
        redirect_role: Option<&str>,
    ) -> SessionResult<SessionOutcome> {
        self.transition(&SessionMachineInput::AuthChanged)?;

        let profile = match self.fetch_profile(&user.id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Profile lookup failed, continuing without identity");
                return self.fail_open();
            }
        };

        if let Some(profile) = profile {
            let hint = self.resolve_hint(redirect_role);
            if let Some((hinted, source)) = hint {
                if hinted != profile.role() {
                    warn!(
                        user_id = %user.id,
                        stored_role = %profile.role(),
                        hinted_role = %hinted,
                        ?source,
                        "Ignoring role hint for existing profile"
                    );
                }
                self.clear_hints();
            }
            let identity = profile.identity();
            self.pending_user.lock().take();
            self.transition(&SessionMachineInput::ProfileFound)?;
            debug!(user_id = %identity.id, role = %identity.role, "Session ready");
            self.publish(Some(identity.clone()));
            return Ok(SessionOutcome::Ready(identity));
        }

        let Some((role, source)) = self.resolve_hint(redirect_role) else {
            info!(user_id = %user.id, "No profile and no role hint, awaiting role selection");
            *self.pending_user.lock() = Some(user.clone());
            self.transition(&SessionMachineInput::RoleMissing)?;
            self.publish(None);
            return Ok(SessionOutcome::RoleSelectionRequired { user });
        };

        match self.create_profile(&user, role).await {
            Ok(identity) => {
                self.clear_hints();
                self.pending_user.lock().take();
                self.transition(&SessionMachineInput::ProfileCreated)?;
                info!(user_id = %identity.id, role = %identity.role, ?source, "Created profile from role hint");
                self.publish(Some(identity.clone()));
                Ok(SessionOutcome::Ready(identity))
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Profile creation failed, continuing without identity");
                self.fail_open()
            }
        }
    }

    fn fail_open(&self) -> SessionResult<SessionOutcome> {
        self.transition(&SessionMachineInput::LookupFailed)?;
        self.publish(None);
        Ok(SessionOutcome::Anonymous)
    }

    /// The in-memory session always ends. Leftover local storage is logged,
    /// not surfaced.
    fn sign_out_local(&self) -> SessionResult<SessionOutcome> {
        self.pending_user.lock().take();
        self.transition(&SessionMachineInput::SignOut)?;
        self.publish(None);
        if let Err(e) = self.storage.clear_on_sign_out() {
            warn!(error = %e, "Failed to clear session storage on sign-out");
        }
        info!("Signed out");
        Ok(SessionOutcome::SignedOut)
    }

    /// Highest-priority self-assignable hint. Storage trouble counts as no hint.
    fn resolve_hint(&self, redirect_role: Option<&str>) -> Option<(Role, RoleHintSource)> {
        match self.storage.role_hints().resolve(redirect_role) {
            Ok(Some((role, source))) if is_self_assignable(role) => Some((role, source)),
            Ok(Some((role, source))) => {
                warn!(%role, ?source, "Ignoring role hint that cannot be self-assigned");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read role hints");
                None
            }
        }
    }

    fn clear_hints(&self) {
        if let Err(e) = self.storage.role_hints().clear() {
            warn!(error = %e, "Failed to clear role hints");
        }
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, RemoteError> {
        let query = Select::from(tables::PROFILES).eq("id", user_id).single();
        match self.remote.select(&query).await {
            Ok(rows) => match rows.into_iter().next() {
                Some(row) => Ok(Some(decode_row(row)?)),
                None => Ok(None),
            },
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Insert the initial profile. A unique-key conflict means another client
    /// created it first; that row wins.
    async fn create_profile(&self, user: &AuthUser, role: Role) -> SessionResult<Identity> {
        let profile = Profile::new_for(role, &user.id, user.email.clone());
        let row = serde_json::to_value(&profile)?;
        match self.remote.insert(tables::PROFILES, row).await {
            Ok(stored) => Ok(decode_row::<Profile>(stored)?.identity()),
            Err(e) if e.status() == Some(409) => {
                debug!(user_id = %user.id, "Profile already created elsewhere");
                match self.fetch_profile(&user.id).await? {
                    Some(existing) => Ok(existing.identity()),
                    None => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn is_self_assignable(role: Role) -> bool {
    matches!(role, Role::Teacher | Role::School)
}
