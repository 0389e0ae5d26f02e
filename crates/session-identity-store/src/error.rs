//! Session store error types.

use board_types::Role;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Invalid transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// `complete_role_selection` called with no sign-in waiting on it
    #[error("No signed-in user is waiting for a role choice")]
    NoPendingUser,

    /// Only teacher and school may be self-assigned
    #[error("Role {0} cannot be chosen at sign-up")]
    RoleNotSelectable(Role),

    /// The profile already exists; its role never changes
    #[error("Profile already has role {0}")]
    RoleAlreadyAssigned(Role),

    #[error("Remote error: {0}")]
    Remote(#[from] remote_data_client::RemoteError),

    #[error("Storage error: {0}")]
    Storage(#[from] board_storage::StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
