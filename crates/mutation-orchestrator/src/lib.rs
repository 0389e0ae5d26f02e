//! Mutation orchestration for the Teacher Board client.
//!
//! [`MutationOrchestrator::mutate`] runs one typed [`Mutation`]: identity and
//! role checks, form and data-layer validation, a single remote write, then
//! invalidation of the fixed set of [`keys`] that write can make stale. Remote
//! failures are mapped onto [`ErrorKind`].
//!
//! [`BoardQueries`] is the read side: typed fetches through the shared
//! [`entity_query_cache::QueryCache`] under the same keys.

mod error;
pub mod keys;
mod mutation;
mod orchestrator;
mod queries;
pub mod validation;

pub use error::{ErrorKind, MutationError, MutationResult};
pub use mutation::{Mutation, MutationOutput};
pub use orchestrator::MutationOrchestrator;
pub use queries::{spawn_cache_reset, BoardQueries};
