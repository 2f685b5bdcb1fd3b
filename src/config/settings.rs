//! Settings file parsing (`settings.conf`).
//!
//! The settings file is a flat `key = value` document in the config
//! directory. Unknown keys are ignored so older and newer builds can share
//! one file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::exec::FailurePolicy;
use crate::util::config::parse_key_values;

/// Name of the settings file inside the config directory.
const SETTINGS_FILE: &str = "settings.conf";

/// Skeleton written when no settings file exists yet.
const SETTINGS_SKELETON: &str = "\
# venvman settings
#
# venv_dir         base directory scanned for virtual environments
# failure_policy   strict | exit-code-only
#                  strict treats any stderr output from pip as fatal;
#                  exit-code-only fails on non-zero exit status alone
# kill_grace_secs  seconds between a stop request and a forced kill
#
# venv_dir = ~/.virtualenvs
# failure_policy = strict
# kill_grace_secs = 5
";

/// Runtime settings resolved from `settings.conf` over built-in defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Base directory scanned for virtual environments.
    pub venv_dir: PathBuf,
    /// How stderr output from managed tools is classified.
    pub failure_policy: FailurePolicy,
    /// Grace period between a stop request and a forced kill.
    pub kill_grace: Duration,
}

impl Settings {
    /// What: Built-in defaults for a given home directory.
    ///
    /// Inputs:
    /// - `home`: The user's home directory.
    ///
    /// Output:
    /// - `~/.virtualenvs`, strict failure policy, 5 second kill grace.
    #[must_use]
    pub fn default_for_home(home: &Path) -> Self {
        Self {
            venv_dir: home.join(".virtualenvs"),
            failure_policy: FailurePolicy::Strict,
            kill_grace: Duration::from_secs(5),
        }
    }

    /// What: Apply `key = value` overrides from a settings file body.
    ///
    /// Inputs:
    /// - `contents`: Full text of `settings.conf`.
    ///
    /// Output:
    /// - A copy of `self` with recognized keys overridden.
    ///
    /// Details:
    /// - `~/` prefixes in `venv_dir` are expanded against `$HOME`.
    /// - Unrecognized values are ignored with a warning rather than failing
    ///   startup.
    #[must_use]
    pub fn with_overrides(mut self, contents: &str) -> Self {
        for (key, value) in parse_key_values(contents) {
            match key.as_str() {
                "venv_dir" => {
                    self.venv_dir = expand_home(&value);
                }
                "failure_policy" => match value.as_str() {
                    "strict" => self.failure_policy = FailurePolicy::Strict,
                    "exit-code-only" => self.failure_policy = FailurePolicy::ExitCodeOnly,
                    other => {
                        tracing::warn!(value = %other, "unknown failure_policy; keeping default");
                    }
                },
                "kill_grace_secs" => {
                    if let Ok(secs) = value.parse::<u64>() {
                        self.kill_grace = Duration::from_secs(secs);
                    } else {
                        tracing::warn!(value = %value, "kill_grace_secs is not a number; keeping default");
                    }
                }
                _ => {}
            }
        }
        self
    }

    /// What: Load settings from the config directory, writing a commented
    /// skeleton on first run.
    ///
    /// Inputs:
    /// - `config`: Config directory (see [`crate::config::config_dir`]).
    ///
    /// Output:
    /// - Resolved settings; defaults when the file is missing or unreadable.
    #[must_use]
    pub fn load(config: &Path) -> Self {
        let home = std::env::var("HOME").map_or_else(|_| PathBuf::from("."), PathBuf::from);
        let defaults = Self::default_for_home(&home);
        let path = config.join(SETTINGS_FILE);
        match std::fs::read_to_string(&path) {
            Ok(contents) => defaults.with_overrides(&contents),
            Err(_) => {
                // First run: leave a commented skeleton behind for the user.
                let _ = std::fs::write(&path, SETTINGS_SKELETON);
                defaults
            }
        }
    }
}

/// What: Expand a leading `~/` against `$HOME`.
///
/// Inputs:
/// - `raw`: Path value from the settings file.
///
/// Output:
/// - Expanded path, or the raw value when no `~/` prefix is present.
fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return Path::new(&home).join(rest);
    }
    PathBuf::from(raw)
}
