//! Logging initialization.
//!
//! Thin wrapper over the observability package: the CLI writes structured JSONL
//! to `<base>/logs/dev.jsonl` and compact lines to stderr.

use crate::Paths;
use observability::LogConfig;

/// Initialize logging for the CLI with the given default level.
///
/// `RUST_LOG` overrides `level` when set.
pub fn init_logging(level: &str, paths: &Paths) -> bool {
    init_logging_for_service("teacher-board", level, paths)
}

/// Initialize logging under a custom service name.
pub fn init_logging_for_service(service_name: &str, level: &str, paths: &Paths) -> bool {
    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: level.into(),
        log_path: Some(paths.log_file()),
        json_file: true,
        also_stderr: matches!(
            observability::parse_level(level),
            tracing::Level::DEBUG | tracing::Level::TRACE
        ),
    })
}
