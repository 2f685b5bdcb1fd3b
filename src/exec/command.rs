//! Shell command construction for environment actions.
//!
//! Everything here is pure string building: the activation wrapper that
//! brackets one tool invocation between `activate` and `deactivate`, the
//! fixed pip sub-commands, and the `python -m venv` creation call. Side
//! effects live in the runner, never here.

use std::path::Path;

use crate::error::Result;
use crate::util::shell_single_quote;

/// Host OS family the activation wrapper is built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OsFamily {
    /// Unix-like hosts using `source <env>/bin/activate`.
    Posix,
    /// Windows hosts using `<env>\Scripts\activate.bat`.
    Windows,
}

impl OsFamily {
    /// What: Detect the OS family of the running host.
    ///
    /// Output:
    /// - `Posix` on unix targets, `Windows` on windows targets, and a
    ///   configuration error on anything else, never a silent fallback.
    #[allow(clippy::unnecessary_wraps)] // Err arm exists only on exotic targets
    pub fn host() -> Result<Self> {
        #[cfg(unix)]
        {
            Ok(Self::Posix)
        }
        #[cfg(windows)]
        {
            Ok(Self::Windows)
        }
        #[cfg(not(any(unix, windows)))]
        {
            Err(crate::error::Error::UnsupportedOs(
                std::env::consts::OS.to_string(),
            ))
        }
    }
}

/// One tool invocation: tool name plus ordered argument list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Executable name resolved inside the activated environment.
    pub tool: String,
    /// Ordered arguments, unquoted.
    pub args: Vec<String>,
}

impl ToolInvocation {
    /// What: Build an invocation from a tool name and arguments.
    ///
    /// Inputs:
    /// - `tool`: Executable name (e.g. `pip`).
    /// - `args`: Ordered arguments.
    #[must_use]
    pub fn new<S: Into<String>>(tool: S, args: Vec<String>) -> Self {
        Self {
            tool: tool.into(),
            args,
        }
    }

    /// What: `pip install --no-cache-dir --upgrade <package>`.
    #[must_use]
    pub fn pip_install(package: &str) -> Self {
        Self::new(
            "pip",
            vec![
                "install".into(),
                "--no-cache-dir".into(),
                "--upgrade".into(),
                package.into(),
            ],
        )
    }

    /// What: `pip install --no-cache-dir --requirement <file>`.
    #[must_use]
    pub fn pip_install_requirement(file: &str) -> Self {
        Self::new(
            "pip",
            vec![
                "install".into(),
                "--no-cache-dir".into(),
                "--requirement".into(),
                file.into(),
            ],
        )
    }

    /// What: `pip install --no-cache-dir --editable <project dir>`.
    #[must_use]
    pub fn pip_install_editable(project: &str) -> Self {
        Self::new(
            "pip",
            vec![
                "install".into(),
                "--no-cache-dir".into(),
                "--editable".into(),
                project.into(),
            ],
        )
    }

    /// What: `pip list`.
    #[must_use]
    pub fn pip_list() -> Self {
        Self::new("pip", vec!["list".into()])
    }

    /// What: `pip freeze`.
    #[must_use]
    pub fn pip_freeze() -> Self {
        Self::new("pip", vec!["freeze".into()])
    }

    /// What: `pip uninstall --yes <package>`.
    #[must_use]
    pub fn pip_uninstall(package: &str) -> Self {
        Self::new(
            "pip",
            vec!["uninstall".into(), "--yes".into(), package.into()],
        )
    }

    /// What: `pipdeptree` dependency-tree listing.
    #[must_use]
    pub fn dependency_tree() -> Self {
        Self::new("pipdeptree", Vec::new())
    }

    /// What: `pip install --no-cache-dir --upgrade pip` (the manager
    /// upgrading itself).
    #[must_use]
    pub fn pip_self_upgrade() -> Self {
        Self::pip_install("pip")
    }

    /// What: Whether this invocation upgrades the package manager itself.
    ///
    /// Details:
    /// - pip cannot reliably replace its own running executable file on some
    ///   platforms, so the activation builder substitutes a direct
    ///   interpreter invocation for these.
    #[must_use]
    pub fn upgrades_manager(&self) -> bool {
        self.tool == "pip"
            && self.args.iter().any(|a| a == "install")
            && self.args.last().is_some_and(|a| a == "pip")
    }

    /// What: Render the invocation as one shell fragment for `family`.
    ///
    /// Details:
    /// - Arguments containing whitespace or quotes are quoted; plain
    ///   arguments are passed through untouched so commands stay readable in
    ///   logs.
    #[must_use]
    pub fn rendered(&self, family: OsFamily) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(quote_arg(&self.tool, family));
        for arg in &self.args {
            parts.push(quote_arg(arg, family));
        }
        parts.join(" ")
    }
}

/// What: Quote a single argument for the target shell when needed.
///
/// Inputs:
/// - `arg`: Raw argument text.
/// - `family`: Target OS family.
///
/// Output:
/// - The argument, single-quoted (POSIX) or double-quoted (Windows) when it
///   contains whitespace or quote characters; unchanged otherwise.
fn quote_arg(arg: &str, family: OsFamily) -> String {
    let needs_quoting = arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '\'');
    if !needs_quoting {
        return arg.to_string();
    }
    match family {
        OsFamily::Posix => shell_single_quote(arg),
        OsFamily::Windows => format!("\"{}\"", arg.replace('"', "\"\"")),
    }
}

/// What: Render a path for the target family with normalized separators.
///
/// Details:
/// - Windows command strings always use `\`; POSIX strings always use `/`.
///   This keeps the builder a pure function testable on any host.
fn render_path(p: &Path, family: OsFamily) -> String {
    let raw = p.display().to_string();
    match family {
        OsFamily::Posix => raw.replace('\\', "/"),
        OsFamily::Windows => raw.replace('/', "\\"),
    }
}

/// What: Path of the interpreter copied into an environment.
///
/// Inputs:
/// - `base`: Base directory holding environments.
/// - `name`: Environment name.
/// - `family`: Target OS family.
///
/// Output:
/// - `<base>/<name>/bin/python` (POSIX) or `<base>\<name>\Scripts\python.exe`
///   (Windows) as a display string.
#[must_use]
pub fn env_python(base: &Path, name: &str, family: OsFamily) -> String {
    match family {
        OsFamily::Posix => format!("{}/{name}/bin/python", render_path(base, family)),
        OsFamily::Windows => {
            format!("{}\\{name}\\Scripts\\python.exe", render_path(base, family))
        }
    }
}

/// What: Build the shell command that activates an environment, runs one
/// tool invocation, and deactivates.
///
/// Inputs:
/// - `family`: OS family of the target shell.
/// - `base`: Base directory holding environments.
/// - `name`: Environment name.
/// - `invocation`: Tool invocation to bracket.
///
/// Output:
/// - POSIX: `source <base>/<name>/bin/activate; <cmd>; deactivate;`
/// - Windows: `<base>\<name>\Scripts\activate.bat && <cmd> &&
///   <base>\<name>\Scripts\deactivate.bat`
///
/// Details:
/// - The activation prologue and deactivation epilogue exactly bracket the
///   invocation; nothing is inserted between them.
/// - A manager self-upgrade is substituted with a direct interpreter
///   invocation (`<env python> -m pip install --no-cache-dir --upgrade pip`)
///   because pip cannot replace its own running executable everywhere.
#[must_use]
pub fn build_activation_command(
    family: OsFamily,
    base: &Path,
    name: &str,
    invocation: &ToolInvocation,
) -> String {
    let inner = if invocation.upgrades_manager() {
        let python = env_python(base, name, family);
        let mut direct = vec![quote_arg(&python, family), "-m".to_string()];
        direct.push(invocation.tool.clone());
        direct.extend(invocation.args.iter().map(|a| quote_arg(a, family)));
        direct.join(" ")
    } else {
        invocation.rendered(family)
    };
    match family {
        OsFamily::Posix => {
            let root = format!("{}/{name}", render_path(base, family));
            format!("source {root}/bin/activate; {inner}; deactivate;")
        }
        OsFamily::Windows => {
            let root = format!("{}\\{name}", render_path(base, family));
            format!("{root}\\Scripts\\activate.bat && {inner} && {root}\\Scripts\\deactivate.bat")
        }
    }
}

/// Options for environment creation.
#[derive(Clone, Copy, Debug, Default)]
pub struct CreateOptions {
    /// Skip installing pip into the new environment.
    pub without_pip: bool,
    /// Give the environment visibility of global site-packages.
    pub system_site_packages: bool,
}

/// What: Build the `python -m venv` command creating a new environment.
///
/// Inputs:
/// - `family`: OS family of the target shell.
/// - `python`: Interpreter to create the environment with.
/// - `env_dir`: Directory the environment is created in.
/// - `opts`: Creation flags.
///
/// Output:
/// - `<interpreter> -m venv <dir> [--without-pip] [--system-site-packages]`
///
/// Details:
/// - Runs outside any activation wrapper; there is no environment to
///   activate yet.
#[must_use]
pub fn build_create_command(
    family: OsFamily,
    python: &Path,
    env_dir: &Path,
    opts: CreateOptions,
) -> String {
    let mut cmd = format!(
        "{} -m venv {}",
        quote_arg(&render_path(python, family), family),
        quote_arg(&render_path(env_dir, family), family),
    );
    if opts.without_pip {
        cmd.push_str(" --without-pip");
    }
    if opts.system_site_packages {
        cmd.push_str(" --system-site-packages");
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    /// What: Check the POSIX activation wrapper brackets the invocation exactly.
    ///
    /// Inputs:
    /// - Environment `envA` under `/tmp/envs`, installing `example-pkg`.
    ///
    /// Output:
    /// - `source /tmp/envs/envA/bin/activate; pip install --no-cache-dir
    ///   --upgrade example-pkg; deactivate;` with no intermediate text.
    fn command_build_activation_command_posix_brackets_invocation() {
        let cmd = build_activation_command(
            OsFamily::Posix,
            &PathBuf::from("/tmp/envs"),
            "envA",
            &ToolInvocation::pip_install("example-pkg"),
        );
        assert_eq!(
            cmd,
            "source /tmp/envs/envA/bin/activate; pip install --no-cache-dir --upgrade example-pkg; deactivate;"
        );
    }

    #[test]
    /// What: Check the Windows activation wrapper uses batch scripts and backslashes.
    ///
    /// Inputs:
    /// - Environment `envA` under `C:/envs`, listing installed packages.
    ///
    /// Output:
    /// - `activate.bat && pip list && deactivate.bat` with `\` separators
    ///   throughout.
    fn command_build_activation_command_windows_uses_bat_and_backslashes() {
        let cmd = build_activation_command(
            OsFamily::Windows,
            &PathBuf::from("C:/envs"),
            "envA",
            &ToolInvocation::pip_list(),
        );
        assert_eq!(
            cmd,
            "C:\\envs\\envA\\Scripts\\activate.bat && pip list && C:\\envs\\envA\\Scripts\\deactivate.bat"
        );
    }

    #[test]
    /// What: Verify the manager self-upgrade is routed through the interpreter.
    ///
    /// Inputs:
    /// - The `pip_self_upgrade` invocation for `envA` under `/tmp/envs`.
    ///
    /// Output:
    /// - The inner command is `<env>/bin/python -m pip install --no-cache-dir
    ///   --upgrade pip`, still bracketed by activate/deactivate.
    fn command_self_upgrade_substitutes_interpreter_invocation() {
        let inv = ToolInvocation::pip_self_upgrade();
        assert!(inv.upgrades_manager());
        let cmd =
            build_activation_command(OsFamily::Posix, &PathBuf::from("/tmp/envs"), "envA", &inv);
        assert_eq!(
            cmd,
            "source /tmp/envs/envA/bin/activate; /tmp/envs/envA/bin/python -m pip install --no-cache-dir --upgrade pip; deactivate;"
        );
    }

    #[test]
    /// What: Confirm ordinary installs are not mistaken for self-upgrades.
    ///
    /// Inputs:
    /// - Installs of `example-pkg` and of `pipdeptree`, plus `pip list`.
    ///
    /// Output:
    /// - None of them report `upgrades_manager()`.
    fn command_upgrades_manager_is_specific_to_pip() {
        assert!(!ToolInvocation::pip_install("example-pkg").upgrades_manager());
        assert!(!ToolInvocation::pip_install("pipdeptree").upgrades_manager());
        assert!(!ToolInvocation::pip_list().upgrades_manager());
        assert!(!ToolInvocation::pip_uninstall("pip").upgrades_manager());
    }

    #[test]
    /// What: Check fixed pip sub-command shapes.
    ///
    /// Inputs:
    /// - Requirement-file and editable installs, uninstall, freeze, tree.
    ///
    /// Output:
    /// - Rendered fragments match the fixed sub-commands with flags in order.
    fn command_pip_subcommand_shapes() {
        assert_eq!(
            ToolInvocation::pip_install_requirement("reqs.txt").rendered(OsFamily::Posix),
            "pip install --no-cache-dir --requirement reqs.txt"
        );
        assert_eq!(
            ToolInvocation::pip_install_editable("/src/proj").rendered(OsFamily::Posix),
            "pip install --no-cache-dir --editable /src/proj"
        );
        assert_eq!(
            ToolInvocation::pip_uninstall("example-pkg").rendered(OsFamily::Posix),
            "pip uninstall --yes example-pkg"
        );
        assert_eq!(
            ToolInvocation::pip_freeze().rendered(OsFamily::Posix),
            "pip freeze"
        );
        assert_eq!(
            ToolInvocation::dependency_tree().rendered(OsFamily::Posix),
            "pipdeptree"
        );
    }

    #[test]
    /// What: Quote arguments containing whitespace per target shell.
    ///
    /// Inputs:
    /// - A requirement file path with a space, rendered for both families.
    ///
    /// Output:
    /// - POSIX single quotes; Windows double quotes.
    fn command_arguments_with_spaces_are_quoted() {
        let inv = ToolInvocation::pip_install_requirement("my reqs.txt");
        assert_eq!(
            inv.rendered(OsFamily::Posix),
            "pip install --no-cache-dir --requirement 'my reqs.txt'"
        );
        assert_eq!(
            inv.rendered(OsFamily::Windows),
            "pip install --no-cache-dir --requirement \"my reqs.txt\""
        );
    }

    #[test]
    /// What: Check creation command flags and quoting.
    ///
    /// Inputs:
    /// - Interpreter `/usr/bin/python3.12`, target `/tmp/envs/envA`, each
    ///   flag combination.
    ///
    /// Output:
    /// - `-m venv` with optional `--without-pip` / `--system-site-packages`
    ///   appended in that order.
    fn command_build_create_command_flags() {
        let python = PathBuf::from("/usr/bin/python3.12");
        let dir = PathBuf::from("/tmp/envs/envA");
        assert_eq!(
            build_create_command(OsFamily::Posix, &python, &dir, CreateOptions::default()),
            "/usr/bin/python3.12 -m venv /tmp/envs/envA"
        );
        assert_eq!(
            build_create_command(
                OsFamily::Posix,
                &python,
                &dir,
                CreateOptions {
                    without_pip: true,
                    system_site_packages: true
                }
            ),
            "/usr/bin/python3.12 -m venv /tmp/envs/envA --without-pip --system-site-packages"
        );
    }

    #[test]
    /// What: Environment python path per family.
    ///
    /// Inputs:
    /// - Base `/tmp/envs` (POSIX) and `C:/envs` (Windows), name `envA`.
    ///
    /// Output:
    /// - `bin/python` vs `Scripts\python.exe` layouts.
    fn command_env_python_layout_per_family() {
        assert_eq!(
            env_python(&PathBuf::from("/tmp/envs"), "envA", OsFamily::Posix),
            "/tmp/envs/envA/bin/python"
        );
        assert_eq!(
            env_python(&PathBuf::from("C:/envs"), "envA", OsFamily::Windows),
            "C:\\envs\\envA\\Scripts\\python.exe"
        );
    }
}
