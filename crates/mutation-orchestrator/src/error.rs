//! Mutation error taxonomy.
//!
//! Remote failures are classified by status, PostgREST/Postgres code and
//! message text:
//!
//! | match                                            | kind             |
//! |--------------------------------------------------|------------------|
//! | `23505`, "duplicate key"                         | Conflict         |
//! | `42501`, HTTP 403, "permission", "policy"        | NotAuthorized    |
//! | `PGRST301`, HTTP 401, "JWT", expired session     | NotAuthenticated |
//! | no response at all                               | NetworkError     |
//! | anything else                                    | ServerError      |

use entity_query_cache::QueryError;
use remote_data_client::RemoteError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    NotAuthenticated,
    NotAuthorized,
    Conflict,
    NetworkError,
    ServerError,
}

impl ErrorKind {
    /// Message shown to the user. Each kind has its own.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "Some fields are missing or invalid.",
            ErrorKind::NotAuthenticated => "Please sign in to continue.",
            ErrorKind::NotAuthorized => "You do not have permission to do this.",
            ErrorKind::Conflict => "This record already exists.",
            ErrorKind::NetworkError => "Network error. Check your connection and try again.",
            ErrorKind::ServerError => "Something went wrong on the server. Please try again later.",
        }
    }

    pub fn classify(error: &RemoteError) -> ErrorKind {
        if matches!(error, RemoteError::SessionExpired) {
            return ErrorKind::NotAuthenticated;
        }
        if error.is_transport() {
            return ErrorKind::NetworkError;
        }

        let code = error.code().unwrap_or("");
        let status = error.status();
        let text = error.full_text().to_lowercase();

        if code == "23505" || text.contains("duplicate key") {
            ErrorKind::Conflict
        } else if code == "42501"
            || status == Some(403)
            || text.contains("permission")
            || text.contains("policy")
        {
            ErrorKind::NotAuthorized
        } else if code == "PGRST301" || status == Some(401) || text.contains("jwt") {
            ErrorKind::NotAuthenticated
        } else {
            ErrorKind::ServerError
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::NotAuthenticated => "not_authenticated",
            ErrorKind::NotAuthorized => "not_authorized",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::ServerError => "server_error",
        };
        f.write_str(name)
    }
}

/// A failed mutation (or read, via [`MutationError::from_query`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct MutationError {
    pub kind: ErrorKind,
    /// Detail for logs or field hints. Use [`MutationError::user_message`]
    /// for display.
    pub message: String,
}

impl MutationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorKind::NotAuthenticated, "no signed-in identity")
    }

    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthorized, message)
    }

    pub fn user_message(&self) -> &'static str {
        self.kind.user_message()
    }

    /// Classify a failed cache read the same way as a failed write.
    pub fn from_query(error: &QueryError) -> Self {
        match error.source_as::<RemoteError>() {
            Some(remote) => Self::new(ErrorKind::classify(remote), remote.to_string()),
            None => Self::new(ErrorKind::ServerError, error.to_string()),
        }
    }
}

impl From<RemoteError> for MutationError {
    fn from(error: RemoteError) -> Self {
        Self::new(ErrorKind::classify(&error), error.full_text())
    }
}

impl From<serde_json::Error> for MutationError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorKind::ServerError, format!("unexpected response shape: {}", error))
    }
}

pub type MutationResult<T> = Result<T, MutationError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(status: u16, code: Option<&str>, message: &str) -> ErrorKind {
        ErrorKind::classify(&RemoteError::api(status, code, message))
    }

    #[test]
    fn duplicate_key_is_conflict() {
        assert_eq!(
            kind(409, Some("23505"), "duplicate key value violates unique constraint"),
            ErrorKind::Conflict
        );
        assert_eq!(kind(400, None, "Duplicate key on applications"), ErrorKind::Conflict);
    }

    #[test]
    fn policy_failures_are_not_authorized() {
        assert_eq!(kind(403, None, "forbidden"), ErrorKind::NotAuthorized);
        assert_eq!(kind(400, Some("42501"), "insufficient privilege"), ErrorKind::NotAuthorized);
        assert_eq!(
            kind(400, None, "new row violates row-level security policy"),
            ErrorKind::NotAuthorized
        );
        assert_eq!(kind(400, None, "permission denied for table"), ErrorKind::NotAuthorized);
    }

    #[test]
    fn auth_failures_are_not_authenticated() {
        assert_eq!(kind(401, Some("PGRST301"), "JWT expired"), ErrorKind::NotAuthenticated);
        assert_eq!(kind(400, None, "invalid JWT"), ErrorKind::NotAuthenticated);
        assert_eq!(
            ErrorKind::classify(&RemoteError::SessionExpired),
            ErrorKind::NotAuthenticated
        );
    }

    #[test]
    fn transport_and_other_failures() {
        assert_eq!(
            ErrorKind::classify(&RemoteError::Transport("connection refused".into())),
            ErrorKind::NetworkError
        );
        assert_eq!(kind(500, None, "internal error"), ErrorKind::ServerError);
    }

    #[test]
    fn every_kind_has_its_own_message() {
        let kinds = [
            ErrorKind::ValidationError,
            ErrorKind::NotAuthenticated,
            ErrorKind::NotAuthorized,
            ErrorKind::Conflict,
            ErrorKind::NetworkError,
            ErrorKind::ServerError,
        ];
        let mut messages: Vec<&str> = kinds.iter().map(|k| k.user_message()).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), kinds.len());
    }
}
