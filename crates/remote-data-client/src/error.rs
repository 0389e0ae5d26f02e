//! Error types for remote data operations.

use serde::Deserialize;
use thiserror::Error;

/// PostgREST code returned when a single-row request matched zero (or many) rows.
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Error body returned by PostgREST and GoTrue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, alias = "msg", alias = "error_description")]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network or transport-level HTTP error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure that did not come from reqwest (connection refused
    /// by a local stand-in, simulated outage).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("Supabase error: {status} - {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
        details: Option<String>,
        hint: Option<String>,
    },

    /// The stored session expired and could not be refreshed.
    #[error("Session expired")]
    SessionExpired,

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL or missing credentials.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local storage for the auth session failed.
    #[error("Storage error: {0}")]
    Storage(#[from] board_storage::StorageError),
}

impl RemoteError {
    pub fn api(status: u16, code: Option<&str>, message: impl Into<String>) -> Self {
        RemoteError::Api {
            status,
            code: code.map(str::to_string),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    pub(crate) fn from_body(status: u16, raw: &str) -> Self {
        match serde_json::from_str::<ApiErrorBody>(raw) {
            Ok(body) => RemoteError::Api {
                status,
                code: body.code,
                message: body.message.unwrap_or_else(|| raw.to_string()),
                details: body.details,
                hint: body.hint,
            },
            Err(_) => RemoteError::api(status, None, raw),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Api { status, .. } => Some(*status),
            RemoteError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            RemoteError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Message plus details and hint, for substring classification.
    pub fn full_text(&self) -> String {
        match self {
            RemoteError::Api {
                message,
                details,
                hint,
                ..
            } => [Some(message.as_str()), details.as_deref(), hint.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" "),
            other => other.to_string(),
        }
    }

    /// A single-row read matched nothing.
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(NO_ROWS_CODE)
    }

    /// The request never produced a response.
    pub fn is_transport(&self) -> bool {
        match self {
            RemoteError::Transport(_) => true,
            RemoteError::Http(e) => e.status().is_none(),
            _ => false,
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgrest_body_is_parsed() {
        let err = RemoteError::from_body(
            409,
            r#"{"code":"23505","message":"duplicate key value violates unique constraint","details":"Key (id)=(1) already exists.","hint":null}"#,
        );
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.code(), Some("23505"));
        assert!(err.full_text().contains("duplicate key"));
        assert!(err.full_text().contains("already exists"));
    }

    #[test]
    fn gotrue_msg_alias_is_parsed() {
        let err = RemoteError::from_body(400, r#"{"msg":"Invalid login credentials"}"#);
        assert_eq!(err.full_text(), "Invalid login credentials");
    }

    #[test]
    fn non_json_body_is_kept_verbatim() {
        let err = RemoteError::from_body(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Supabase error: 502 - Bad Gateway");
        assert!(!err.is_transport());
    }

    #[test]
    fn not_found_detection() {
        assert!(RemoteError::api(406, Some(NO_ROWS_CODE), "0 rows").is_not_found());
        assert!(!RemoteError::api(404, None, "nope").is_not_found());
        assert!(RemoteError::Transport("reset".into()).is_transport());
    }
}
