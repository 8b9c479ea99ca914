//! Logging Infrastructure
//!
//! Structured logging setup shared by binaries and integration tests.

use tracing_subscriber::EnvFilter;

/// Initialize the logger with the default level (`info`).
pub fn init_logger() {
    init_logger_with_level("info");
}

/// Initialize the logger with an explicit level, honouring `RUST_LOG`.
///
/// Safe to call more than once; subsequent calls are no-ops.
pub fn init_logger_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false)
        .try_init();
}
