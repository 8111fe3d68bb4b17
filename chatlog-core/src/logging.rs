//! Tracing setup: rolling log file plus optional stderr mirror.

use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::schema::LoggingConfig;

/// Prefix of the daily log files (`chatlog.log.YYYY-MM-DD`)
const LOG_FILE_PREFIX: &str = "chatlog.log";

/// Days a rotated log file is kept before cleanup
const LOG_RETENTION_DAYS: u64 = 7;

/// Initialize the logging system.
///
/// The returned guard flushes the non-blocking file writer on drop and must
/// be held for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> WorkerGuard {
    let filter = build_filter(config);

    let format_str = std::env::var("LOG_FORMAT").unwrap_or_else(|_| config.format.clone());
    let is_json = format_str.eq_ignore_ascii_case("json");

    if let Err(e) = std::fs::create_dir_all(&config.dir) {
        eprintln!("Failed to create log directory {}: {}", config.dir, e);
    }
    let file_appender = tracing_appender::rolling::daily(&config.dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = if is_json {
        fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    // stdout carries the chat transcript, so the mirror goes to stderr
    let console_layer = if !config.console {
        None
    } else if is_json {
        Some(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed(),
        )
    } else {
        Some(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed(),
        )
    };

    Registry::default()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    if let Err(e) = cleanup_old_logs(Path::new(&config.dir), LOG_RETENTION_DAYS) {
        eprintln!("Failed to clean up old logs: {}", e);
    }

    guard
}

/// Build the filter from `RUST_LOG`, falling back to the configured level,
/// then layer the per-module overrides on top.
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    for (module, level) in &config.overrides {
        match format!("{}={}", module, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(_) => eprintln!("Invalid log directive: {}={}", module, level),
        }
    }

    filter
}

/// Remove log files older than `days` days
fn cleanup_old_logs(dir: &Path, days: u64) -> std::io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let now = SystemTime::now();
    let threshold = Duration::from_secs(days * 24 * 3600);

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX));
        if !is_log {
            continue;
        }

        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if age.is_some_and(|age| age > threshold) {
            if let Err(e) = std::fs::remove_file(&path) {
                eprintln!("Failed to remove old log file {:?}: {}", path, e);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cleanup_keeps_fresh_and_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let fresh = temp_dir.path().join("chatlog.log.2026-10-19");
        let foreign = temp_dir.path().join("notes.txt");
        std::fs::write(&fresh, "x").unwrap();
        std::fs::write(&foreign, "y").unwrap();

        cleanup_old_logs(temp_dir.path(), 7).unwrap();

        assert!(fresh.exists());
        assert!(foreign.exists());
    }

    #[test]
    fn test_cleanup_with_zero_retention_removes_logs_only() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("chatlog.log.2026-10-01");
        let foreign = temp_dir.path().join("2026-10-01.json");
        std::fs::write(&log, "x").unwrap();
        std::fs::write(&foreign, "[]").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        cleanup_old_logs(temp_dir.path(), 0).unwrap();

        assert!(!log.exists());
        assert!(foreign.exists());
    }

    #[test]
    fn test_cleanup_missing_dir_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        assert!(cleanup_old_logs(&temp_dir.path().join("absent"), 7).is_ok());
    }

    #[test]
    fn test_invalid_override_is_skipped() {
        let mut config = LoggingConfig::default();
        config
            .overrides
            .insert("chatlog_core".to_string(), "not-a-level".to_string());
        config
            .overrides
            .insert("chatlog_agent".to_string(), "debug".to_string());

        let filter = build_filter(&config);
        assert!(filter.to_string().contains("chatlog_agent=debug"));
    }
}
