//! venvman binary entrypoint kept minimal. Actions live in `args`.

mod args;
mod config;
mod error;
mod exec;
mod index;
mod runtime;
mod state;
mod util;

use std::sync::OnceLock;
use std::{fmt, time::SystemTime};

use clap::Parser;

struct VenvmanTimer;

impl tracing_subscriber::fmt::time::FormatTime for VenvmanTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let secs = match SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(_) => 0,
        };
        let s = crate::util::ts_to_date(Some(secs)); // "YYYY-MM-DD HH:MM:SS"
        let ts = s.replacen(' ', "-T", 1); // "YYYY-MM-DD-T HH:MM:SS"
        w.write_str(&ts)
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// What: Initialize the non-blocking file logger.
///
/// Inputs:
/// - `level`: Default log level when `RUST_LOG` is unset.
///
/// Details:
/// - Writes to `~/.config/venvman/logs/venvman.log`; falls back to stderr
///   when the log file cannot be opened.
fn init_logging(level: &str) {
    let mut log_path = crate::config::logs_dir();
    log_path.push("venvman.log");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(VenvmanTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            // Fallback: init stderr logger to avoid blocking startup
            let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(true)
                .with_timer(VenvmanTimer)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

#[tokio::main]
async fn main() {
    let parsed = args::Args::parse();
    init_logging(&args::determine_log_level(&parsed));
    tracing::info!(dry_run = parsed.dry_run, "venvman starting");

    args::process_args(&parsed).await;

    // No action flag given: default to the environment summary.
    args::list::handle_list(&parsed);
}
