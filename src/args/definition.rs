//! Command-line argument definition and processing.

use clap::Parser;

/// venvman - A fast, friendly manager for Python virtual environments
#[derive(Parser, Debug)]
#[command(name = "venvman")]
#[command(version)]
#[command(
    about = "A fast, friendly manager for creating, inspecting and maintaining Python virtual environments",
    long_about = None
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Args {
    /// Print the command instead of executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Base directory scanned for environments (default: settings.conf venv_dir)
    #[arg(long)]
    pub base_dir: Option<String>,

    /// List discovered environments
    #[arg(short = 'l', long)]
    pub list: bool,

    /// List known interpreters from the session cache
    #[arg(long)]
    pub interpreters: bool,

    /// Rebuild the interpreter cache before anything else
    #[arg(short = 'y', long)]
    pub refresh: bool,

    /// Create a new environment with the given name
    #[arg(short = 'c', long)]
    pub create: Option<String>,

    /// Interpreter to create the environment with (default: newest cached)
    #[arg(long)]
    pub python: Option<String>,

    /// Create the environment without pip
    #[arg(long)]
    pub without_pip: bool,

    /// Give the environment visibility of global site-packages
    #[arg(long)]
    pub system_site_packages: bool,

    /// Free-text comment stored in the environment metadata (use with --create)
    #[arg(long)]
    pub comment: Option<String>,

    /// Remove an environment directory (asks for confirmation)
    #[arg(short = 'r', long)]
    pub remove: Option<String>,

    /// Skip confirmation prompts
    #[arg(long)]
    pub yes: bool,

    /// Target environment for package actions
    #[arg(short = 'e', long)]
    pub env: Option<String>,

    /// Install packages into --env (comma-separated or space-separated)
    #[arg(short = 'i', long, num_args = 1..)]
    pub install: Vec<String>,

    /// Install from a requirements file into --env
    #[arg(long)]
    pub requirement: Option<String>,

    /// Install a local project in editable mode into --env
    #[arg(long)]
    pub editable: Option<String>,

    /// Uninstall a package from --env
    #[arg(short = 'u', long)]
    pub uninstall: Option<String>,

    /// List installed packages in --env
    #[arg(long)]
    pub packages: bool,

    /// Freeze installed packages of --env in requirements format
    #[arg(long)]
    pub freeze: bool,

    /// Show the dependency tree of --env
    #[arg(long)]
    pub tree: bool,

    /// Upgrade pip itself inside --env
    #[arg(long)]
    pub upgrade_pip: bool,

    /// Bootstrap pip into --env via ensurepip
    #[arg(long)]
    pub bootstrap_pip: bool,

    /// Associate an external project directory with --env
    #[arg(long)]
    pub attach: Option<String>,
}

/// What: Process all command-line arguments and handle early-exit actions.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Returns when no action flag was given (the caller then prints the
///   environment summary); every action handler exits the process itself.
///
/// Details:
/// - `--refresh` runs first so later handlers see a fresh cache, then
///   continues to any other requested action.
/// - Package actions require `--env` and report a usage error without it.
pub async fn process_args(args: &Args) {
    use crate::args::{attach, create, list, pip, refresh, remove};

    // Handle interpreter cache refresh first so later actions see fresh data
    if args.refresh {
        refresh::handle_refresh(args);
    }

    // Handle environment listing
    if args.list {
        list::handle_list(args);
    }

    // Handle interpreter listing
    if args.interpreters {
        list::handle_interpreters(args);
    }

    // Handle environment creation
    if let Some(name) = &args.create {
        create::handle_create(args, name).await;
    }

    // Handle environment removal
    if let Some(name) = &args.remove {
        remove::handle_remove(args, name);
    }

    // Handle project attachment
    if let Some(project) = &args.attach {
        attach::handle_attach(args, project);
    }

    // Package actions against --env
    if !args.install.is_empty()
        || args.requirement.is_some()
        || args.editable.is_some()
        || args.uninstall.is_some()
        || args.packages
        || args.freeze
        || args.tree
        || args.upgrade_pip
        || args.bootstrap_pip
    {
        pip::handle_package_actions(args).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: The argument surface parses its core flag combinations.
    ///
    /// Inputs:
    /// - An install invocation with environment and dry-run, and a create
    ///   invocation with creation flags.
    ///
    /// Output:
    /// - Fields land where expected; defaults hold elsewhere.
    fn definition_args_parse_core_combinations() {
        let args = Args::parse_from([
            "venvman",
            "--install",
            "example-pkg",
            "--env",
            "envA",
            "--dry-run",
        ]);
        assert_eq!(args.install, vec!["example-pkg".to_string()]);
        assert_eq!(args.env.as_deref(), Some("envA"));
        assert!(args.dry_run);
        assert!(!args.list);

        let args = Args::parse_from([
            "venvman",
            "--create",
            "envB",
            "--python",
            "/usr/bin/python3.12",
            "--system-site-packages",
        ]);
        assert_eq!(args.create.as_deref(), Some("envB"));
        assert_eq!(args.python.as_deref(), Some("/usr/bin/python3.12"));
        assert!(args.system_site_packages);
        assert!(!args.without_pip);
    }
}
