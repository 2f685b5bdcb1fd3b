//! Shared utilities for argument processing.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::index::{Context, FsStore};

/// What: Determine the log level based on command-line arguments.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Log level string (trace, debug, info, warn, error).
///
/// Details:
/// - Verbose flag overrides the `log_level` argument.
pub fn determine_log_level(args: &crate::args::Args) -> String {
    if args.verbose {
        "debug".to_string()
    } else {
        args.log_level.clone()
    }
}

/// What: Resolve settings for the current invocation.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Settings from `settings.conf`. Precedence for the base directory:
///   `--base-dir`, then the `venv_dir` setting, then the active-directory
///   pointer left by the last scan, then the built-in default.
///
/// Details:
/// - The pointer file is only consulted, never written here; discovery is
///   its single writer and a missing pointer simply falls through.
#[must_use]
pub fn resolve_settings(args: &crate::args::Args) -> Settings {
    let config = crate::config::config_dir();
    let mut settings = Settings::load(&config);
    if let Some(dir) = &args.base_dir {
        settings.venv_dir = PathBuf::from(dir);
        return settings;
    }
    let home = std::env::var("HOME").map_or_else(|_| PathBuf::from("."), PathBuf::from);
    let defaulted = settings.venv_dir == Settings::default_for_home(&home).venv_dir;
    if defaulted && let Some(last) = crate::config::read_active_dir(&config) {
        settings.venv_dir = last;
    }
    settings
}

/// What: Build the discovery context for the current invocation.
///
/// Inputs:
/// - `settings`: Resolved settings.
///
/// Output:
/// - A context backed by the filesystem store in the config directory.
#[must_use]
pub fn discovery_context(settings: Settings) -> Context {
    Context::new(
        settings,
        Arc::new(FsStore::new(crate::config::config_dir())),
    )
}

/// What: Prompt the user for yes/no confirmation.
///
/// Inputs:
/// - `message`: The prompt message to display.
///
/// Output:
/// - `true` if user confirms (default), `false` if user explicitly declines (n/N/no).
///
/// Details:
/// - Reads a single line from stdin.
/// - Defaults to "yes" (empty input or Enter key).
/// - Returns `false` only if user explicitly enters 'n', 'N', or 'no'.
pub fn prompt_user(message: &str) -> bool {
    use std::io::{self, Write};

    print!("{message} [Y/n]: ");
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_ok() {
        let trimmed = input.trim();
        // Default to yes (empty input), only return false for explicit 'n' or 'no'
        !(trimmed.eq_ignore_ascii_case("n") || trimmed.eq_ignore_ascii_case("no"))
    } else {
        true // Default to yes on read error
    }
}

/// What: Prompt the user for yes/no confirmation with "No" as default.
///
/// Inputs:
/// - `message`: The prompt message to display.
///
/// Output:
/// - `true` if user explicitly confirms (y/Y/yes), `false` otherwise (default).
///
/// Details:
/// - Reads a single line from stdin.
/// - Defaults to "no" (empty input or Enter key).
/// - Returns `true` only if user explicitly enters 'y', 'Y', or 'yes'.
pub fn prompt_user_no_default(message: &str) -> bool {
    use std::io::{self, Write};

    print!("{message} [y/N]: ");
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_ok() {
        let trimmed = input.trim();
        // Default to no (empty input), only return true for explicit 'y' or 'yes'
        trimmed.eq_ignore_ascii_case("y") || trimmed.eq_ignore_ascii_case("yes")
    } else {
        false // Default to no on read error
    }
}

/// What: Run one action through the runtime and stream its console output.
///
/// Inputs:
/// - `settings`: Resolved settings.
/// - `action`: Action to perform.
/// - `dry_run`: When `true`, prints the command instead of executing.
///
/// Output:
/// - `true` when the action succeeded (or dry-ran), `false` on failure.
///
/// Details:
/// - stdout lines go to stdout, stderr lines and the failure notification
///   to stderr, mirroring the streams of the underlying tool.
pub async fn run_action(settings: Settings, action: crate::exec::Action, dry_run: bool) -> bool {
    use crate::exec::{ConsoleEvent, EnvLocks, Orchestrator, StreamKind};
    use crate::runtime::{ActionOutput, ActionRequest, Channels};

    if dry_run {
        let orchestrator = Orchestrator::new(settings, EnvLocks::new());
        match orchestrator.render_command(&action) {
            Ok(cmd) => {
                println!("DRY RUN: {cmd}");
                return true;
            }
            Err(e) => {
                eprintln!("Error: {e}");
                return false;
            }
        }
    }

    let mut channels = Channels::new(settings);
    if channels
        .action_req_tx
        .send(ActionRequest { action })
        .is_err()
    {
        eprintln!("Error: executor worker is gone");
        return false;
    }

    while let Some(output) = channels.action_res_rx.recv().await {
        match output {
            ActionOutput::Console(ConsoleEvent::Line { stream, text }) => match stream {
                StreamKind::Stdout => println!("{text}"),
                StreamKind::Stderr => eprintln!("{text}"),
            },
            ActionOutput::Console(ConsoleEvent::Failed { message }) => {
                eprintln!("Error: {message}");
            }
            ActionOutput::Succeeded { outcome } => {
                tracing::debug!(code = outcome.exit_code, "action completed");
                return true;
            }
            ActionOutput::Failed { message } => {
                eprintln!("Error: {message}");
                return false;
            }
        }
    }
    eprintln!("Error: executor worker exited unexpectedly");
    false
}
