//! Error types for cache reads.

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// The fetch function failed. Cached until the key is invalidated.
    #[error("query {key} failed: {source}")]
    Fetch {
        key: String,
        source: Arc<dyn StdError + Send + Sync>,
    },

    /// The entry holds a value of a different type than requested.
    #[error("query {key} holds a different type than {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

impl QueryError {
    /// The fetch function's error, if it is an `E`.
    pub fn source_as<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            QueryError::Fetch { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
