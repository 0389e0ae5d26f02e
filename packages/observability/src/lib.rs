//! # Observability
//!
//! Logging setup shared by every Teacher Board crate.
//!
//! Library crates only emit events through the `tracing` macros. The binary
//! calls [`init_with_config`] once at startup and decides where those events
//! go:
//!
//! - a JSONL file (`~/.teacherboard/logs/dev.jsonl` unless overridden), one
//!   object per line with timestamp, level, service, target and fields
//! - optionally a compact human-readable stream on stderr
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "teacher-board".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     });
//!     tracing::info!("ready");
//! }
//! ```

mod file_sink;
mod json_layer;

use std::path::PathBuf;

pub use file_sink::{default_log_path, CentralLogWriter};
pub use json_layer::{JsonLayer, LogEntry};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, written into every JSON line.
    pub service_name: String,

    /// Default filter (e.g. "debug", "info,remote_data_client=trace").
    /// `RUST_LOG` takes precedence when set.
    pub default_level: String,

    /// Custom JSONL path. Defaults to [`default_log_path`].
    pub log_path: Option<PathBuf>,

    /// Write JSONL to a file at all. Disabled for short-lived CLI runs.
    pub json_file: bool,

    /// Also emit compact logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            json_file: true,
            also_stderr: false,
        }
    }
}

/// Initialize logging with defaults for the given service.
pub fn init(service_name: &str) -> bool {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    })
}

/// Initialize logging with a custom configuration.
///
/// Returns `false` when a global subscriber was already installed (tests
/// commonly hit this) or the log file could not be opened; in the latter case
/// the stderr layer is still installed when requested.
pub fn init_with_config(config: LogConfig) -> bool {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer};

    let env_filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.default_level))
    };

    let log_path = config.log_path.clone().or_else(default_log_path);
    let mut file_error = None;

    let json_layer = match (config.json_file, log_path.as_ref()) {
        (true, Some(path)) => match CentralLogWriter::new(path) {
            Ok(writer) => Some(
                JsonLayer::new(config.service_name.clone(), writer).with_filter(env_filter()),
            ),
            Err(e) => {
                file_error = Some(e);
                None
            }
        },
        _ => None,
    };

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(env_filter())
    });

    let installed = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if let Some(e) = file_error {
        tracing::warn!(error = %e, "could not open log file, JSONL output disabled");
        return false;
    }

    if installed {
        tracing::debug!(
            service = %config.service_name,
            log_path = ?log_path,
            "observability initialized"
        );
    }
    installed
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

pub use tracing::{debug, error, info, instrument, trace, warn, Level};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(config.json_file);
        assert!(!config.also_stderr);
    }

    #[test]
    fn parse_level_variants() {
        assert_eq!(parse_level("TRACE"), tracing::Level::TRACE);
        assert_eq!(parse_level("debug"), tracing::Level::DEBUG);
        assert_eq!(parse_level("Warning"), tracing::Level::WARN);
        assert_eq!(parse_level("error"), tracing::Level::ERROR);
        assert_eq!(parse_level("nonsense"), tracing::Level::INFO);
    }
}
