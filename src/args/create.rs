//! Command-line environment creation.

use std::path::PathBuf;

use crate::args::utils::{discovery_context, resolve_settings, run_action};
use crate::exec::{Action, CreateOptions};
use crate::index::{interpreters, metadata};
use crate::state::VenvMetadata;

/// What: Pick the interpreter used for creation.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - `--python` when given (bare names are resolved on `PATH`), else the
///   newest cached interpreter, or exits 1 naming the missing prerequisite.
fn resolve_python(args: &crate::args::Args) -> PathBuf {
    if let Some(python) = &args.python {
        if !crate::util::command_on_path(python) {
            eprintln!("Error: interpreter `{python}` not found");
            tracing::error!(python = %python, "requested interpreter missing");
            std::process::exit(1);
        }
        let path = PathBuf::from(python);
        if path.is_file() {
            return path;
        }
        // Bare executable name: resolve it on PATH.
        match which::which(python) {
            Ok(found) => return found,
            Err(e) => {
                eprintln!("Error: interpreter `{python}` not found: {e}");
                std::process::exit(1);
            }
        }
    }
    let ctx = discovery_context(resolve_settings(args));
    let mut cached = interpreters::load_or_rebuild(&ctx).unwrap_or_default();
    // Version strings sort well enough lexically within one minor series;
    // the newest cached interpreter is the last after a sort.
    cached.sort_by(|a, b| a.version.cmp(&b.version));
    match cached.pop() {
        Some(item) => item.path,
        None => {
            eprintln!("Error: no Python interpreter found; install one or pass --python");
            tracing::error!("no interpreter available for environment creation");
            std::process::exit(1);
        }
    }
}

/// What: Handle `--create NAME` by running the venv creation command.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
/// - `name`: Environment name.
///
/// Output:
/// - Exits 0 on success, 1 on failure.
///
/// Details:
/// - On success a metadata record is written next to the descriptor,
///   carrying the `--comment` text when given.
pub async fn handle_create(args: &crate::args::Args, name: &str) {
    let settings = resolve_settings(args);
    let base = settings.venv_dir.clone();
    let python = resolve_python(args);
    tracing::info!(name = %name, python = %python.display(), "create requested from CLI");

    let action = Action::Create {
        name: name.to_string(),
        python,
        opts: CreateOptions {
            without_pip: args.without_pip,
            system_site_packages: args.system_site_packages,
        },
    };
    if !run_action(settings, action, args.dry_run).await {
        std::process::exit(1);
    }
    if args.dry_run {
        std::process::exit(0);
    }

    let root = base.join(name);
    let meta = VenvMetadata {
        directory: base.clone(),
        name: name.to_string(),
        comment: args.comment.clone().unwrap_or_default(),
        project_dirs: Vec::new(),
    };
    if let Err(e) = metadata::save_metadata(&root, &meta) {
        // The environment itself is fine; the record is best-effort here.
        tracing::warn!(error = %e, "could not write environment metadata");
    }
    println!("Created environment {name} under {}", base.display());
    std::process::exit(0);
}
