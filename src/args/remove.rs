//! Command-line environment removal.

use crate::args::utils::{prompt_user_no_default, resolve_settings};
use crate::index::environments;

/// What: Handle `--remove NAME` by deleting the environment directory.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
/// - `name`: Environment name.
///
/// Output:
/// - Exits 0 on success or user cancel, 1 on failure.
///
/// Details:
/// - Only directories carrying a recognizable descriptor are removed; an
///   arbitrary directory under the base dir is refused.
/// - Asks for confirmation unless `--yes` is given. Removal defaults to
///   "no" since it is destructive.
pub fn handle_remove(args: &crate::args::Args, name: &str) -> ! {
    let settings = resolve_settings(args);
    let root = settings.venv_dir.join(name);
    tracing::info!(name = %name, "remove requested from CLI");

    if !root.is_dir() {
        eprintln!("Error: environment `{name}` does not exist");
        tracing::error!(name = %name, "remove target missing");
        std::process::exit(1);
    }
    if environments::read_descriptor(&root).is_none() {
        eprintln!(
            "Error: {} is not a virtual environment (no recognizable {})",
            root.display(),
            environments::DESCRIPTOR_FILE
        );
        tracing::error!(path = %root.display(), "remove target has no descriptor");
        std::process::exit(1);
    }

    if args.dry_run {
        println!("DRY RUN: remove {}", root.display());
        std::process::exit(0);
    }
    if !args.yes && !prompt_user_no_default(&format!("Remove environment {name} permanently?")) {
        println!("Cancelled.");
        std::process::exit(0);
    }

    match std::fs::remove_dir_all(&root) {
        Ok(()) => {
            println!("Removed environment {name}");
            tracing::info!(name = %name, "environment removed");
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: could not remove {}: {e}", root.display());
            tracing::error!(error = %e, name = %name, "environment removal failed");
            std::process::exit(1);
        }
    }
}
