//! Logging Infrastructure
//!
//! Structured logging for the edge server. `RUST_LOG` overrides the level
//! passed in; the `security` target carries audit events.

use std::path::Path;

use tracing_subscriber::EnvFilter;

pub type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

/// Initialize the logger with defaults (info, plain text, stdout)
pub fn init_logger() -> InitResult {
    init_logger_with_file(None, false, None)
}

/// Initialize the logger with optional JSON formatting and daily file output
///
/// Fails if a global subscriber is already installed.
pub fn init_logger_with_file(
    log_level: Option<&str>,
    json: bool,
    log_dir: Option<&Path>,
) -> InitResult {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    // 目录不存在时退回到标准输出
    let file_appender = log_dir
        .filter(|dir| dir.exists())
        .map(|dir| tracing_appender::rolling::daily(dir, "mesa-edge"));

    match (json, file_appender) {
        (true, Some(writer)) => builder.json().with_writer(writer).try_init(),
        (true, None) => builder.json().try_init(),
        (false, Some(writer)) => builder.with_ansi(false).with_writer(writer).try_init(),
        (false, None) => builder.try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails_instead_of_panicking() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = init_logger_with_file(Some("debug"), false, Some(dir.path()));
        let second = init_logger();
        // 同一进程内只能有一个全局 subscriber
        assert!(first.is_err() || second.is_err());
    }
}
