//! Client for the hosted data/auth service.
//!
//! The sync layer talks to the backend only through [`RemoteDataService`]:
//!
//! ```text
//! MutationOrchestrator / QueryCache fetchers
//!          │
//!          ▼
//!   RemoteDataService ──► SupabaseClient ──► /rest/v1, /auth/v1
//!          │
//!          └────────────► MemoryRemote (tests, offline runs)
//! ```
//!
//! Auth state changes are published on a broadcast channel so the session
//! store can follow SIGNED_IN / SIGNED_OUT without polling.

mod error;
mod memory;
mod query;
mod service;
mod supabase;

pub use error::{ApiErrorBody, RemoteError, RemoteResult, NO_ROWS_CODE};
pub use memory::{Fault, MemoryRemote};
pub use query::{Filter, IsValue, Order, Select};
pub use service::{decode_row, decode_rows, AuthEvent, RemoteDataService};
pub use supabase::{SignUpOutcome, SupabaseClient};
