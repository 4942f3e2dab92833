//! Tracing setup for the two ways composer runs.
//!
//! `composer serve` is long-lived, so when `logging.to_file` is set its events
//! go to a timestamped file under `<state>/logs/`. The other subcommands
//! (`steps`, `drafts`, `compose`) always write to stderr so stdout carries only
//! their output.
//!
//! The level comes from `RUST_LOG` when set, then `--debug`, then
//! `logging.level` in config.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Keeps the file writer alive; drop it only at exit so buffered events flush
pub struct LoggingHandle {
    pub _guard: Option<WorkerGuard>,
    /// Set when events go to a file
    pub log_file_path: Option<PathBuf>,
}

/// Install the global subscriber. Call once, before any command runs.
pub fn init_logging(
    config: &Config,
    is_server_mode: bool,
    debug_override: bool,
) -> Result<LoggingHandle> {
    let filter = EnvFilter::new(filter_directive(
        std::env::var("RUST_LOG").ok(),
        config,
        debug_override,
    ));

    if logs_to_file(config, is_server_mode) {
        let logs_dir = config.logs_path();
        std::fs::create_dir_all(&logs_dir)
            .with_context(|| format!("Failed to create logs directory {}", logs_dir.display()))?;

        // Generate log filename with ISO8601 timestamp
        let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
        let log_filename = log_file_name(&timestamp.to_string());
        let log_file_path = logs_dir.join(&log_filename);

        let file_appender = tracing_appender::rolling::never(&logs_dir, &log_filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false) // No ANSI codes in log files
                    .with_writer(non_blocking),
            )
            .init();

        Ok(LoggingHandle {
            _guard: Some(guard),
            log_file_path: Some(log_file_path),
        })
    } else {
        // CLI mode, or file logging disabled: log to stderr
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();

        Ok(LoggingHandle {
            _guard: None,
            log_file_path: None,
        })
    }
}

fn filter_directive(rust_log: Option<String>, config: &Config, debug_override: bool) -> String {
    match rust_log {
        Some(directive) => directive,
        None if debug_override => "debug".to_string(),
        None => config.logging.level.clone(),
    }
}

fn log_file_name(timestamp: &str) -> String {
    format!("composer-{timestamp}.log")
}

/// Whether `init_logging` would write to a file for this mode
pub fn logs_to_file(config: &Config, is_server_mode: bool) -> bool {
    is_server_mode && config.logging.to_file
}
