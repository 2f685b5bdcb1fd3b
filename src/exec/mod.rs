//! Process-execution subsystem.
//!
//! Splits the external-command path into focused submodules: pure command
//! construction, the single-command runner, the line-oriented output relay,
//! and the per-action orchestrator. Public API is re-exported here.

pub mod command;
pub mod orchestrator;
pub mod relay;
pub mod runner;

pub use command::{CreateOptions, OsFamily, ToolInvocation, build_activation_command};
pub use orchestrator::{Action, EnvLocks, ExecOutcome, InstallSpec, Orchestrator};
pub use relay::{ConsoleEvent, FailurePolicy, OutputRelay};
pub use runner::{ExecRequest, ProcessRunner, RunnerEvent, StreamKind};
