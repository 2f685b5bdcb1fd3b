//! Command-line project attachment.

use std::path::PathBuf;

use crate::args::utils::resolve_settings;
use crate::index::metadata;

/// What: Handle `--attach PROJECT --env NAME` by updating the metadata record.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
/// - `project`: Project directory to associate.
///
/// Output:
/// - Exits 0 on success, 1 on a missing environment or `--env`.
pub fn handle_attach(args: &crate::args::Args, project: &str) -> ! {
    let Some(env) = &args.env else {
        eprintln!("Error: --attach requires --env NAME");
        std::process::exit(1);
    };
    let settings = resolve_settings(args);
    let root = settings.venv_dir.join(env);
    if !root.is_dir() {
        eprintln!("Error: environment `{env}` does not exist");
        tracing::error!(env = %env, "attach target missing");
        std::process::exit(1);
    }

    match metadata::attach_project(&root, env, &PathBuf::from(project)) {
        Ok(meta) => {
            println!(
                "Associated {project} with {env} ({} project(s) total)",
                meta.project_dirs.len()
            );
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            tracing::error!(error = %e, env = %env, "attach failed");
            std::process::exit(1);
        }
    }
}
