//! Session resolution state machine.
//!
//! ```text
//!  ┌───────────┐  AuthChanged   ┌───────────┐  ProfileFound / ProfileCreated  ┌───────┐
//!  │ SignedOut │ ─────────────► │ Resolving │ ──────────────────────────────► │ Ready │
//!  └───────────┘                └───────────┘                                 └───────┘
//!        ▲                        │       │ RoleMissing     ┌──────────────┐
//!        │ SignOut (any state)    │       └───────────────► │ AwaitingRole │
//!        │                        │ LookupFailed            └──────────────┘
//!        │                        ▼                            │ RoleChosen
//!        │                  ┌───────────┐                      └──► Resolving
//!        └───────────────── │ Anonymous │
//!                           └───────────┘
//! ```
//!
//! `Ready`, `AwaitingRole` and `Anonymous` all accept `AuthChanged` again
//! (token refresh, second sign-in).

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(SignedOut)

    SignedOut => {
        AuthChanged => Resolving,
        SignOut => SignedOut
    },
    Resolving => {
        ProfileFound => Ready,
        ProfileCreated => Ready,
        RoleMissing => AwaitingRole,
        LookupFailed => Anonymous,
        AuthChanged => Resolving,
        SignOut => SignedOut
    },
    Ready => {
        AuthChanged => Resolving,
        SignOut => SignedOut
    },
    AwaitingRole => {
        RoleChosen => Resolving,
        AuthChanged => Resolving,
        SignOut => SignedOut
    },
    Anonymous => {
        AuthChanged => Resolving,
        SignOut => SignedOut
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Externally visible session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    SignedOut,
    /// Looking up (or creating) the profile for a fresh auth event.
    Resolving,
    /// Identity with a role is available.
    Ready,
    /// Signed in, no profile, no role hint. A role must be chosen.
    AwaitingRole,
    /// Signed in but the profile could not be read.
    Anonymous,
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready)
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::SignedOut => SessionState::SignedOut,
            SessionMachineState::Resolving => SessionState::Resolving,
            SessionMachineState::Ready => SessionState::Ready,
            SessionMachineState::AwaitingRole => SessionState::AwaitingRole,
            SessionMachineState::Anonymous => SessionState::Anonymous,
        }
    }
}
