//! Command-line listing of environments and interpreters.

use crate::args::utils::{discovery_context, resolve_settings};
use crate::index::{environments, interpreters};
use crate::state::SitePackages;

/// What: Handle `--list` by printing every discovered environment.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Exits 0 after printing; exits 1 when discovery itself fails.
///
/// Details:
/// - One line per environment: name, interpreter version, isolation mode,
///   and a marker when the recorded interpreter is missing on this machine.
/// - Records the scanned base directory in the active-directory pointer.
pub fn handle_list(args: &crate::args::Args) -> ! {
    let settings = resolve_settings(args);
    let base = settings.venv_dir.clone();
    let ctx = discovery_context(settings);

    let cached = match interpreters::load_or_rebuild(&ctx) {
        Ok(items) => items,
        Err(e) => {
            eprintln!("Error: {e}");
            tracing::error!(error = %e, "interpreter cache unavailable");
            std::process::exit(1);
        }
    };
    let envs = match environments::scan_environments(&ctx, &cached) {
        Ok(items) => items,
        Err(e) => {
            eprintln!("Error: {e}");
            tracing::error!(error = %e, "environment scan failed");
            std::process::exit(1);
        }
    };

    let _ = crate::config::write_active_dir(&crate::config::config_dir(), &base);

    if envs.is_empty() {
        println!("No environments found under {}", base.display());
        std::process::exit(0);
    }
    println!("Environments under {}:", base.display());
    for env in &envs {
        let mode = match env.site_packages {
            SitePackages::Isolated => "isolated",
            SitePackages::Global => "system-site-packages",
        };
        let missing = if env.interpreter_present {
            ""
        } else {
            "  [interpreter missing]"
        };
        println!("  {:<24} {:<10} {mode}{missing}", env.name, env.version);
    }
    std::process::exit(0);
}

/// What: Handle `--interpreters` by printing the cached interpreter list.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Exits 0 after printing; exits 1 when the cache is malformed.
pub fn handle_interpreters(args: &crate::args::Args) -> ! {
    let ctx = discovery_context(resolve_settings(args));
    match interpreters::load_or_rebuild(&ctx) {
        Ok(items) => {
            if items.is_empty() {
                println!("No Python interpreters found.");
            } else {
                println!("Known interpreters:");
                for item in &items {
                    println!("  {:<10} {}", item.version, item.path.display());
                }
            }
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            tracing::error!(error = %e, "interpreter listing failed");
            std::process::exit(1);
        }
    }
}
