//! Command-line package actions against one environment.

use std::path::PathBuf;

use crate::args::utils::{prompt_user, resolve_settings, run_action};
use crate::exec::command::{OsFamily, env_python};
use crate::exec::orchestrator::pip_is_functional;
use crate::exec::{Action, InstallSpec};

/// What: Parse package names from input, handling comma- and space-separated forms.
///
/// Inputs:
/// - `packages`: Vector of package strings (may contain comma-separated values).
///
/// Output:
/// - Vector of individual package names.
fn parse_package_names(packages: &[String]) -> Vec<String> {
    let mut result = Vec::new();
    for pkg in packages {
        for name in pkg.split(',') {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                result.push(trimmed.to_string());
            }
        }
    }
    result
}

/// What: Make sure the target environment has a working pip, offering a
/// bootstrap when it does not.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
/// - `env`: Target environment name.
///
/// Output:
/// - Returns when pip works (possibly after a bootstrap); exits 1 when the
///   user declines or the bootstrap fails.
///
/// Details:
/// - The probe actually invokes `python -m pip --version`; a present
///   executable alone is an unreliable signal since a failed earlier
///   install can leave a broken one behind.
async fn ensure_pip(args: &crate::args::Args, env: &str) {
    let settings = resolve_settings(args);
    let Ok(family) = OsFamily::host() else {
        eprintln!("Error: unsupported host OS");
        std::process::exit(1);
    };
    let python = env_python(&settings.venv_dir, env, family);
    if pip_is_functional(&python) {
        return;
    }

    eprintln!("Environment `{env}` has no working pip.");
    if !prompt_user("Bootstrap pip with ensurepip now?") {
        println!("Cancelled.");
        std::process::exit(1);
    }
    let ok = run_action(
        settings,
        Action::BootstrapPip {
            env: env.to_string(),
        },
        args.dry_run,
    )
    .await;
    if !ok {
        eprintln!("Error: pip bootstrap failed");
        std::process::exit(1);
    }
}

/// What: Handle every package-action flag against `--env`.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Exits 0 when all requested actions succeed, 1 on the first failure.
///
/// Details:
/// - Actions run in a fixed order: bootstrap, pip upgrade, installs,
///   requirement file, editable install, uninstall, list, freeze, tree.
/// - Each action triggers exactly one success or failure path; on success
///   the next action proceeds, on failure the process exits.
#[allow(clippy::cognitive_complexity)] // one flag check per action keeps the order readable
pub async fn handle_package_actions(args: &crate::args::Args) {
    let Some(env) = args.env.clone() else {
        eprintln!("Error: package actions require --env NAME");
        std::process::exit(1);
    };
    tracing::info!(env = %env, "package actions requested from CLI");

    let mut actions: Vec<Action> = Vec::new();
    if args.bootstrap_pip {
        actions.push(Action::BootstrapPip { env: env.clone() });
    }
    if args.upgrade_pip {
        actions.push(Action::UpgradePip { env: env.clone() });
    }
    for pkg in parse_package_names(&args.install) {
        actions.push(Action::Install {
            env: env.clone(),
            spec: InstallSpec::Package(pkg),
        });
    }
    if let Some(file) = &args.requirement {
        actions.push(Action::Install {
            env: env.clone(),
            spec: InstallSpec::Requirement(PathBuf::from(file)),
        });
    }
    if let Some(project) = &args.editable {
        actions.push(Action::Install {
            env: env.clone(),
            spec: InstallSpec::Editable(PathBuf::from(project)),
        });
    }
    if let Some(pkg) = &args.uninstall {
        actions.push(Action::Uninstall {
            env: env.clone(),
            package: pkg.clone(),
        });
    }
    if args.packages {
        actions.push(Action::List { env: env.clone() });
    }
    if args.freeze {
        actions.push(Action::Freeze { env: env.clone() });
    }
    if args.tree {
        actions.push(Action::DependencyTree { env: env.clone() });
    }

    if actions.is_empty() {
        eprintln!("Error: no package action given");
        std::process::exit(1);
    }

    // A dry run never probes or bootstraps; it only prints commands.
    let needs_pip = !args.dry_run
        && actions
            .iter()
            .any(|a| !matches!(a, Action::BootstrapPip { .. } | Action::Create { .. }));
    if needs_pip {
        ensure_pip(args, &env).await;
    }

    for action in actions {
        let settings = resolve_settings(args);
        if !run_action(settings, action, args.dry_run).await {
            std::process::exit(1);
        }
    }
    std::process::exit(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Package name parsing splits commas and trims whitespace.
    ///
    /// Inputs:
    /// - Mixed comma-separated and plain entries with stray spaces.
    ///
    /// Output:
    /// - Flat list of trimmed names with empties dropped.
    fn pip_parse_package_names_splits_and_trims() {
        let input = vec!["requests, flask".to_string(), "  numpy ".to_string()];
        assert_eq!(
            parse_package_names(&input),
            vec![
                "requests".to_string(),
                "flask".to_string(),
                "numpy".to_string()
            ]
        );
        assert!(parse_package_names(&[" , ".to_string()]).is_empty());
    }
}
