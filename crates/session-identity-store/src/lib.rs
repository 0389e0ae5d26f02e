//! Session and identity resolution for the Teacher Board client.
//!
//! [`SessionStore`] listens to auth events from the remote service and keeps
//! the current [`board_types::Identity`] up to date:
//! - existing profile: the stored role wins, role hints are discarded
//! - no profile: the highest-priority role hint creates one
//! - no profile and no hint: the user must pick a role
//! - profile lookup failure: continue without an identity

mod error;
mod session_fsm;
mod store;

pub use error::{SessionError, SessionResult};
pub use session_fsm::session_machine;
pub use session_fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionState};
pub use store::{SessionOutcome, SessionStore};
