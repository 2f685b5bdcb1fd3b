//! Error taxonomy for the orchestration core.
//!
//! Every failure an action can hit is caught at the orchestrator boundary
//! and surfaced to the caller as one of these variants; only genuinely
//! unexpected conditions (unknown OS family, malformed cache file) are meant
//! to abort loudly.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by discovery and orchestration.
#[derive(Debug, Error)]
pub enum Error {
    /// The external tool or shell could not be spawned at all.
    #[error("failed to spawn `{program}`: {message}")]
    Spawn {
        /// Program that could not be started (names the missing prerequisite).
        program: String,
        /// Underlying OS error text.
        message: String,
    },

    /// The tool ran but reported failure (stderr output under the strict
    /// policy, or a non-zero exit status).
    #[error("{tool} failed: {message}")]
    ToolFailed {
        /// Tool that failed (e.g. `pip`).
        tool: String,
        /// Last error-stream text, surfaced verbatim.
        message: String,
    },

    /// The target environment directory vanished out-of-band.
    #[error("environment `{0}` does not exist; refresh the environment list")]
    MissingEnvironment(String),

    /// The environment has no working pip installation.
    #[error("environment `{0}` has no working pip; bootstrap it with ensurepip")]
    MissingPip(String),

    /// The host OS family is not supported by the activation builder.
    #[error("unsupported OS family `{0}`")]
    UnsupportedOs(String),

    /// The interpreter cache file exists but cannot be understood.
    #[error("malformed interpreter cache at {path}: {message}")]
    MalformedCache {
        /// Cache file location.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// A command was started while another one was outstanding on the same
    /// orchestrator instance.
    #[error("an action is already running on this orchestrator")]
    Busy,

    /// Filesystem error outside the categories above.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Metadata (de)serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
