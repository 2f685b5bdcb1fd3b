//! Environment discovery: base-directory scan and descriptor parsing.
//!
//! A directory under the base directory counts as an environment only when
//! it carries a recognizable `pyvenv.cfg`. The descriptor is parsed by key,
//! tolerant of reordering and extra lines; a directory without one is
//! silently excluded from results, never an error.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::index::Context;
use crate::state::{EnvironmentItem, InterpreterItem, SitePackages};
use crate::util::config::parse_key_values;

/// Descriptor file name inside every environment.
pub const DESCRIPTOR_FILE: &str = "pyvenv.cfg";

/// Parsed fields of one `pyvenv.cfg`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PyvenvCfg {
    /// Interpreter bin directory the environment was created from.
    pub home: PathBuf,
    /// Whether global site-packages are visible.
    pub include_system_site_packages: bool,
    /// Interpreter version string.
    pub version: String,
}

/// What: Parse a `pyvenv.cfg` body by key.
///
/// Inputs:
/// - `contents`: Full descriptor text.
///
/// Output:
/// - `Some(cfg)` when the `home` key is present; `None` otherwise (the
///   directory is then not recognized as an environment).
///
/// Details:
/// - Keys may appear in any order; unknown keys are ignored. `version` and
///   the site-packages flag default when absent, matching descriptors
///   written by older interpreters.
#[must_use]
pub fn parse_pyvenv_cfg(contents: &str) -> Option<PyvenvCfg> {
    let mut home: Option<PathBuf> = None;
    let mut include = false;
    let mut version = String::new();
    for (key, value) in parse_key_values(contents) {
        match key.as_str() {
            "home" => home = Some(PathBuf::from(value)),
            "include-system-site-packages" => {
                include = value.eq_ignore_ascii_case("true");
            }
            // venv writes `version`, newer virtualenv writes `version_info`.
            "version" | "version_info" => {
                if version.is_empty() {
                    version = value;
                }
            }
            _ => {}
        }
    }
    Some(PyvenvCfg {
        home: home?,
        include_system_site_packages: include,
        version,
    })
}

/// What: Read and parse the descriptor of one environment directory.
///
/// Output:
/// - `None` when the descriptor is missing or unrecognizable.
#[must_use]
pub fn read_descriptor(env_root: &Path) -> Option<PyvenvCfg> {
    let contents = std::fs::read_to_string(env_root.join(DESCRIPTOR_FILE)).ok()?;
    parse_pyvenv_cfg(&contents)
}

/// What: Whether any cached interpreter lives in the recorded home.
///
/// Details:
/// - `home` in the descriptor is the interpreter's bin directory; an
///   interpreter matches when its parent directory equals it.
fn interpreter_present(home: &Path, interpreters: &[InterpreterItem]) -> bool {
    interpreters
        .iter()
        .any(|i| i.path.parent().is_some_and(|dir| dir == home))
}

/// What: Scan the base directory for environments.
///
/// Inputs:
/// - `ctx`: Discovery context (base directory from settings).
/// - `interpreters`: Cached interpreter list used to derive the
///   interpreter-present flag.
///
/// Output:
/// - Recognized environments sorted by name. A missing base directory
///   yields an empty list; a subdirectory without a recognizable descriptor
///   is skipped.
pub fn scan_environments(
    ctx: &Context,
    interpreters: &[InterpreterItem],
) -> Result<Vec<EnvironmentItem>> {
    let base = &ctx.settings.venv_dir;
    let entries = match std::fs::read_dir(base) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %base.display(), "base directory missing; empty scan");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut items = Vec::new();
    for entry in entries.flatten() {
        let root = entry.path();
        if !root.is_dir() {
            continue;
        }
        let Some(cfg) = read_descriptor(&root) else {
            continue;
        };
        let Some(name) = root.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        items.push(EnvironmentItem {
            name: name.to_string(),
            base_dir: base.clone(),
            version: cfg.version,
            site_packages: if cfg.include_system_site_packages {
                SitePackages::Global
            } else {
                SitePackages::Isolated
            },
            interpreter_present: interpreter_present(&cfg.home, interpreters),
            interpreter_home: cfg.home,
        });
    }
    items.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!(count = items.len(), dir = %base.display(), "environment scan complete");
    Ok(items)
}
