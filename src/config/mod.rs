//! Configuration directory resolution, the settings file, and the
//! per-session active base-directory pointer.

pub mod settings;

pub use settings::Settings;

use std::env;
use std::path::{Path, PathBuf};

/// What: Resolve an XDG base directory from environment or default to `$HOME` + segments.
///
/// Inputs:
/// - `var`: Environment variable to check (e.g., `XDG_CONFIG_HOME`).
/// - `home_default`: Fallback path segments relative to `$HOME` if `var` is unset/empty.
///
/// Output: Resolved base directory path.
fn xdg_base_dir(var: &str, home_default: &[&str]) -> PathBuf {
    if let Ok(p) = env::var(var)
        && !p.trim().is_empty()
    {
        return PathBuf::from(p);
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let mut base = PathBuf::from(home);
    for seg in home_default {
        base = base.join(seg);
    }
    base
}

/// Return `$HOME/.config/venvman`, ensuring it exists.
///
/// Inputs: none
///
/// Output: `Some(PathBuf)` when HOME is set and directory can be created; `None` otherwise.
fn home_config_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        let dir = Path::new(&home).join(".config").join("venvman");
        if std::fs::create_dir_all(&dir).is_ok() {
            return Some(dir);
        }
    }
    None
}

/// XDG config directory for venvman (ensured to exist)
pub fn config_dir() -> PathBuf {
    // Prefer HOME ~/.config/venvman first
    if let Some(dir) = home_config_dir() {
        return dir;
    }
    // Fallback: use XDG_CONFIG_HOME (or default to ~/.config) and ensure
    let base = xdg_base_dir("XDG_CONFIG_HOME", &[".config"]);
    let dir = base.join("venvman");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Logs directory under config: `$HOME/.config/venvman/logs` (ensured to exist)
pub fn logs_dir() -> PathBuf {
    let base = config_dir();
    let dir = base.join("logs");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// What: Read the active base-directory pointer recorded by the last scan.
///
/// Inputs:
/// - `config`: Config directory holding the `active_dir` file.
///
/// Output:
/// - `Some(path)` when the pointer file exists and is non-empty; `None`
///   otherwise (callers treat a missing pointer as "use the settings
///   default and rebuild").
#[must_use]
pub fn read_active_dir(config: &Path) -> Option<PathBuf> {
    let raw = std::fs::read_to_string(config.join("active_dir")).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

/// What: Record the base directory most recently scanned.
///
/// Inputs:
/// - `config`: Config directory holding the `active_dir` file.
/// - `dir`: Base directory to record.
///
/// Output:
/// - `io::Result` from the write; discovery is the single writer of this
///   file.
pub fn write_active_dir(config: &Path, dir: &Path) -> std::io::Result<()> {
    std::fs::write(config.join("active_dir"), format!("{}\n", dir.display()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    #[test]
    /// What: The active-directory pointer round-trips and tolerates absence.
    ///
    /// Inputs:
    /// - A temp config dir without a pointer, then with one written.
    ///
    /// Output:
    /// - Missing file reads as `None`; a written pointer reads back intact.
    fn config_active_dir_round_trip_and_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(super::read_active_dir(dir.path()), None);
        super::write_active_dir(dir.path(), &PathBuf::from("/tmp/envs")).expect("write");
        assert_eq!(
            super::read_active_dir(dir.path()),
            Some(PathBuf::from("/tmp/envs"))
        );
    }
}
