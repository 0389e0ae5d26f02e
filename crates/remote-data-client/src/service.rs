//! The seam between the sync layer and the hosted backend.

use crate::{Filter, RemoteResult, Select};
use async_trait::async_trait;
use board_types::AuthUser;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

/// Auth state changes published by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn {
        user: AuthUser,
        /// Query parameters carried back from the sign-in redirect. Only the
        /// `role` hint is read.
        redirect_role: Option<String>,
    },
    TokenRefreshed {
        user: AuthUser,
    },
    SignedOut,
}

/// Table-style persistence plus auth notifications.
///
/// Every call is a single request; implementations never retry.
#[async_trait]
pub trait RemoteDataService: Send + Sync {
    /// Read rows. With [`Select::single`] exactly one row is returned or a
    /// not-found error is raised.
    async fn select(&self, query: &Select) -> RemoteResult<Vec<Value>>;

    /// Insert one row and return it as stored.
    async fn insert(&self, table: &str, row: Value) -> RemoteResult<Value>;

    /// Patch every row matching `filters` and return the updated rows.
    async fn update(&self, table: &str, filters: &[Filter], patch: Value)
        -> RemoteResult<Vec<Value>>;

    /// Delete every row matching `filters`; returns how many were removed.
    async fn delete(&self, table: &str, filters: &[Filter]) -> RemoteResult<usize>;

    /// Subscribe to auth state changes.
    fn auth_events(&self) -> broadcast::Receiver<AuthEvent>;

    /// User of the current session, if any.
    fn current_user(&self) -> Option<AuthUser>;
}

pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> RemoteResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Into::into))
        .collect()
}

pub fn decode_row<T: DeserializeOwned>(row: Value) -> RemoteResult<T> {
    Ok(serde_json::from_value(row)?)
}
