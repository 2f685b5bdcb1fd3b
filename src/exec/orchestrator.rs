//! Per-action coordination: one user-level action becomes one external
//! command execution plus result handling.
//!
//! The orchestrator builds the command, starts it through the runner, wires
//! the relay to a caller-visible sink, and resolves to exactly one success
//! or failure outcome. Two guards hold the concurrency invariants: a
//! per-instance busy flag (one outstanding command per orchestrator) and a
//! shared per-environment lock registry (actions on the same environment
//! serialize).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::exec::command::{
    CreateOptions, OsFamily, ToolInvocation, build_activation_command, build_create_command,
    env_python,
};
use crate::exec::relay::{ConsoleEvent, OutputRelay};
use crate::exec::runner::{ExecRequest, ProcessRunner, RunnerEvent};

/// What to install into an environment.
#[derive(Clone, Debug)]
pub enum InstallSpec {
    /// A single package by name.
    Package(String),
    /// Everything listed in a requirements file.
    Requirement(PathBuf),
    /// A local project in editable mode.
    Editable(PathBuf),
}

/// One user-level action against an environment.
#[derive(Clone, Debug)]
pub enum Action {
    /// Create a new environment with the given interpreter.
    Create {
        /// Environment name.
        name: String,
        /// Interpreter to create the environment with.
        python: PathBuf,
        /// Creation flags.
        opts: CreateOptions,
    },
    /// Install into an environment.
    Install {
        /// Environment name.
        env: String,
        /// What to install.
        spec: InstallSpec,
    },
    /// List installed packages.
    List {
        /// Environment name.
        env: String,
    },
    /// Freeze installed packages in requirements format.
    Freeze {
        /// Environment name.
        env: String,
    },
    /// Show the dependency tree.
    DependencyTree {
        /// Environment name.
        env: String,
    },
    /// Uninstall one package.
    Uninstall {
        /// Environment name.
        env: String,
        /// Package to remove.
        package: String,
    },
    /// Upgrade the package manager itself.
    UpgradePip {
        /// Environment name.
        env: String,
    },
    /// Bootstrap pip into an environment via `ensurepip`.
    BootstrapPip {
        /// Environment name.
        env: String,
    },
}

impl Action {
    /// What: Environment name this action targets, if any.
    #[must_use]
    pub fn env_name(&self) -> Option<&str> {
        match self {
            Self::Create { name, .. } => Some(name),
            Self::Install { env, .. }
            | Self::List { env }
            | Self::Freeze { env }
            | Self::DependencyTree { env }
            | Self::Uninstall { env, .. }
            | Self::UpgradePip { env }
            | Self::BootstrapPip { env } => Some(env),
        }
    }

    /// What: Whether this action needs a working pip inside the environment.
    const fn needs_pip(&self) -> bool {
        !matches!(self, Self::Create { .. } | Self::BootstrapPip { .. })
    }

    /// What: Tool name used in failure messages.
    const fn tool(&self) -> &'static str {
        match self {
            Self::Create { .. } | Self::BootstrapPip { .. } => "python",
            Self::DependencyTree { .. } => "pipdeptree",
            _ => "pip",
        }
    }
}

/// Final record of one completed command.
#[derive(Clone, Debug)]
pub struct ExecOutcome {
    /// Exit code (`-1` when killed by a signal).
    pub exit_code: i32,
    /// Accumulated standard-output text.
    pub stdout: String,
    /// Accumulated standard-error text.
    pub stderr: String,
}

/// Registry of per-environment locks shared between orchestrator instances.
///
/// Two actions against the same environment serialize on its lock; actions
/// against different environments proceed concurrently.
#[derive(Default)]
pub struct EnvLocks {
    /// Lock per environment root path.
    inner: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl EnvLocks {
    /// What: Create an empty registry.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// What: Fetch (or create) the lock for one environment root.
    async fn lock_for(&self, root: &Path) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        Arc::clone(
            map.entry(root.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

/// Coordinates one external command per user-level action.
pub struct Orchestrator {
    /// Resolved settings (base directory, failure policy, kill grace).
    settings: Settings,
    /// Shared per-environment lock registry.
    locks: Arc<EnvLocks>,
    /// Busy flag: at most one outstanding command per instance.
    running: AtomicBool,
}

/// Resets the busy flag when a run leaves scope on any path.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Orchestrator {
    /// What: Create an orchestrator over the given settings and lock registry.
    #[must_use]
    pub fn new(settings: Settings, locks: Arc<EnvLocks>) -> Self {
        Self {
            settings,
            locks,
            running: AtomicBool::new(false),
        }
    }

    /// What: Render the command an action would run, without running it.
    ///
    /// Output:
    /// - The exact shell string, for dry-run display and logging.
    ///
    /// Errors:
    /// - `UnsupportedOs` when the host family is unknown.
    pub fn render_command(&self, action: &Action) -> Result<String> {
        let family = OsFamily::host()?;
        Ok(self.build(action, family).0)
    }

    /// What: Build the shell command and working directory for an action.
    fn build(&self, action: &Action, family: OsFamily) -> (String, PathBuf) {
        let base = &self.settings.venv_dir;
        match action {
            Action::Create { name, python, opts } => (
                build_create_command(family, python, &base.join(name), *opts),
                base.clone(),
            ),
            Action::Install { env, spec } => {
                let inv = match spec {
                    InstallSpec::Package(pkg) => ToolInvocation::pip_install(pkg),
                    InstallSpec::Requirement(file) => {
                        ToolInvocation::pip_install_requirement(&file.display().to_string())
                    }
                    InstallSpec::Editable(dir) => {
                        ToolInvocation::pip_install_editable(&dir.display().to_string())
                    }
                };
                (
                    build_activation_command(family, base, env, &inv),
                    base.join(env),
                )
            }
            Action::List { env } => (
                build_activation_command(family, base, env, &ToolInvocation::pip_list()),
                base.join(env),
            ),
            Action::Freeze { env } => (
                build_activation_command(family, base, env, &ToolInvocation::pip_freeze()),
                base.join(env),
            ),
            Action::DependencyTree { env } => (
                build_activation_command(family, base, env, &ToolInvocation::dependency_tree()),
                base.join(env),
            ),
            Action::Uninstall { env, package } => (
                build_activation_command(family, base, env, &ToolInvocation::pip_uninstall(package)),
                base.join(env),
            ),
            Action::UpgradePip { env } => (
                build_activation_command(family, base, env, &ToolInvocation::pip_self_upgrade()),
                base.join(env),
            ),
            Action::BootstrapPip { env } => (
                format!(
                    "{} -m ensurepip --upgrade",
                    env_python(base, env, family)
                ),
                base.join(env),
            ),
        }
    }

    /// What: Run one action to completion, streaming console events to `sink`.
    ///
    /// Inputs:
    /// - `action`: Action to perform.
    /// - `sink`: Receives line and failure events as they happen.
    ///
    /// Output:
    /// - `Ok(outcome)` on success, an error otherwise; exactly one of the
    ///   two per launched command.
    ///
    /// Errors:
    /// - `Busy` when a command is already outstanding on this instance.
    /// - `MissingEnvironment` when the target directory vanished.
    /// - `MissingPip` when the environment has no working pip.
    /// - `Spawn` / `ToolFailed` from the command itself.
    pub async fn run(
        &self,
        action: &Action,
        sink: &mut (dyn FnMut(ConsoleEvent) + Send),
    ) -> Result<ExecOutcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::Busy);
        }
        let _guard = RunningGuard(&self.running);

        let family = OsFamily::host()?;
        self.preflight(action, family).await?;

        let (command, cwd) = self.build(action, family);
        let root = self
            .settings
            .venv_dir
            .join(action.env_name().unwrap_or_default());
        let lock = self.locks.lock_for(&root).await;
        let _env_guard = lock.lock().await;

        tracing::info!(action = ?action.tool(), command = %command, "running action");
        self.execute(action, command, cwd, sink).await
    }

    /// What: Action-time checks before any process is spawned.
    ///
    /// Details:
    /// - Create: the interpreter must exist (spawn failures name the missing
    ///   prerequisite); the base directory is created on demand.
    /// - Everything else: the environment directory must still exist, and
    ///   pip-using actions probe for a functional pip (the executable alone
    ///   is an unreliable signal; a failed earlier install can leave a
    ///   present-but-broken one).
    async fn preflight(&self, action: &Action, family: OsFamily) -> Result<()> {
        if let Action::Create { python, .. } = action {
            if !python.is_file() {
                return Err(Error::Spawn {
                    program: python.display().to_string(),
                    message: "interpreter not found".to_string(),
                });
            }
            std::fs::create_dir_all(&self.settings.venv_dir)?;
            return Ok(());
        }

        let Some(env) = action.env_name() else {
            return Ok(());
        };
        let root = self.settings.venv_dir.join(env);
        if !root.is_dir() {
            return Err(Error::MissingEnvironment(env.to_string()));
        }

        if action.needs_pip() {
            let python = env_python(&self.settings.venv_dir, env, family);
            let ok = tokio::task::spawn_blocking(move || pip_is_functional(&python))
                .await
                .unwrap_or(false);
            if !ok {
                return Err(Error::MissingPip(env.to_string()));
            }
        }
        Ok(())
    }

    /// What: Spawn the command and pump runner events through the relay.
    async fn execute(
        &self,
        action: &Action,
        command: String,
        cwd: PathBuf,
        sink: &mut (dyn FnMut(ConsoleEvent) + Send),
    ) -> Result<ExecOutcome> {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<RunnerEvent>();
        let runner = ProcessRunner::new(self.settings.kill_grace);
        runner.spawn(
            ExecRequest {
                command,
                cwd,
            },
            events_tx,
        );

        let mut relay = OutputRelay::new(self.settings.failure_policy);
        let mut exit_code: Option<i32> = None;

        while let Some(event) = events_rx.recv().await {
            match event {
                RunnerEvent::Started => {
                    tracing::debug!("action process started");
                }
                RunnerEvent::Output { stream, bytes } => {
                    let out = relay.on_chunk(stream, &bytes);
                    for ev in out.events {
                        sink(ev);
                    }
                    if out.stop_requested {
                        runner.stop();
                    }
                }
                RunnerEvent::Finished { code } => {
                    exit_code = Some(code);
                    break;
                }
                RunnerEvent::SpawnFailed { message } => {
                    return Err(Error::Spawn {
                        program: action.tool().to_string(),
                        message,
                    });
                }
            }
        }

        for ev in relay.finish() {
            sink(ev);
        }

        let code = exit_code.unwrap_or(-1);
        let outcome = ExecOutcome {
            exit_code: code,
            stdout: relay.stdout_text().to_string(),
            stderr: relay.stderr_text().to_string(),
        };

        if relay.has_failed() {
            return Err(Error::ToolFailed {
                tool: action.tool().to_string(),
                message: last_nonempty_line(&outcome.stderr)
                    .unwrap_or_else(|| "tool wrote to the error stream".to_string()),
            });
        }
        if code != 0 {
            return Err(Error::ToolFailed {
                tool: action.tool().to_string(),
                message: last_nonempty_line(&outcome.stderr)
                    .unwrap_or_else(|| format!("exit status {code}")),
            });
        }
        tracing::info!(code, "action succeeded");
        Ok(outcome)
    }
}

/// What: Probe whether an environment's pip actually works.
///
/// Inputs:
/// - `python`: Interpreter path inside the environment.
///
/// Output:
/// - `true` only when the executable exists and `-m pip --version` exits 0.
#[must_use]
pub fn pip_is_functional(python: &str) -> bool {
    if !Path::new(python).is_file() {
        return false;
    }
    std::process::Command::new(python)
        .args(["-m", "pip", "--version"])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// What: Last line of `text` with non-whitespace content.
fn last_nonempty_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .next_back()
        .map(ToString::to_string)
}
