//! Interpreter discovery and the CSV session cache.
//!
//! Discovery probes a fixed set of candidate executable names plus the
//! interpreter the current session would run, records version and absolute
//! path for each hit, and persists the list to a flat CSV cache. The cache
//! is rebuilt wholesale on every refresh; readers tolerate a missing file
//! by triggering a rebuild.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::index::Context;
use crate::state::InterpreterItem;

/// Cache file name under the store.
pub const CACHE_FILE: &str = "interpreters.csv";

/// Exact header line of the cache file.
pub const CACHE_HEADER: &str = "PYTHON_VERSION,PYTHON_PATH";

/// Fixed candidate executable names probed on every refresh.
const CANDIDATES: &[&str] = &[
    "python3.8",
    "python3.9",
    "python3.10",
    "python3.11",
    "python3.12",
    "python3.13",
    "python3",
    "python",
];

/// What: Ask an interpreter for its version string.
///
/// Inputs:
/// - `path`: Executable to invoke with `--version`.
///
/// Output:
/// - `Some("3.12.4")` style string, or `None` when the executable does not
///   run or prints something unrecognizable.
///
/// Details:
/// - Old interpreters print the banner to stderr, newer ones to stdout;
///   both are checked.
#[must_use]
pub fn interpreter_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("--version")
        .stdin(std::process::Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    parse_version_banner(&stdout).or_else(|| parse_version_banner(&stderr))
}

/// What: Extract `X.Y.Z` from a `Python X.Y.Z` banner.
fn parse_version_banner(banner: &str) -> Option<String> {
    let rest = banner.trim().strip_prefix("Python ")?;
    let version = rest.split_whitespace().next()?;
    if version.is_empty() {
        return None;
    }
    Some(version.to_string())
}

/// What: Probe the fixed candidate list for present interpreters.
///
/// Output:
/// - One item per distinct resolved path, in candidate order.
///
/// Details:
/// - `python3` and `python` usually resolve to a versioned binary already
///   found; duplicates are dropped by path.
#[must_use]
pub fn probe_interpreters() -> Vec<InterpreterItem> {
    let mut found: Vec<InterpreterItem> = Vec::new();
    for name in CANDIDATES {
        let Ok(path) = which::which(name) else {
            continue;
        };
        let resolved = path.canonicalize().unwrap_or(path);
        if found.iter().any(|i| i.path == resolved) {
            continue;
        }
        if let Some(version) = interpreter_version(&resolved) {
            found.push(InterpreterItem {
                version,
                path: resolved,
            });
        }
    }
    found
}

/// What: Resolve the interpreter the current session would run.
///
/// Output:
/// - The `$VIRTUAL_ENV` interpreter when a venv is active, else the first
///   `python3`/`python` on `PATH`, else `None`.
#[must_use]
pub fn running_interpreter() -> Option<InterpreterItem> {
    if let Ok(venv) = std::env::var("VIRTUAL_ENV")
        && !venv.trim().is_empty()
    {
        let candidate = PathBuf::from(venv).join("bin").join("python");
        if let Some(version) = interpreter_version(&candidate) {
            return Some(InterpreterItem {
                version,
                path: candidate,
            });
        }
    }
    for name in ["python3", "python"] {
        if let Ok(path) = which::which(name) {
            let resolved = path.canonicalize().unwrap_or(path);
            if let Some(version) = interpreter_version(&resolved) {
                return Some(InterpreterItem {
                    version,
                    path: resolved,
                });
            }
        }
    }
    None
}

/// What: Serialize interpreters to the CSV cache format.
///
/// Output:
/// - `PYTHON_VERSION,PYTHON_PATH` header plus one line per item.
#[must_use]
pub fn render_cache(items: &[InterpreterItem]) -> String {
    let mut out = String::from(CACHE_HEADER);
    out.push('\n');
    for item in items {
        out.push_str(&format!("{},{}\n", item.version, item.path.display()));
    }
    out
}

/// What: Parse the CSV cache body back into interpreter items.
///
/// Errors:
/// - `MalformedCache` on a wrong header or a line without a separator;
///   a broken cache fails loud rather than silently degrading.
pub fn parse_cache(contents: &str, path: &Path) -> Result<Vec<InterpreterItem>> {
    let mut lines = contents.lines();
    match lines.next() {
        Some(header) if header.trim() == CACHE_HEADER => {}
        other => {
            return Err(Error::MalformedCache {
                path: path.to_path_buf(),
                message: format!("expected header `{CACHE_HEADER}`, found {other:?}"),
            });
        }
    }
    let mut items = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((version, exe)) = trimmed.split_once(',') else {
            return Err(Error::MalformedCache {
                path: path.to_path_buf(),
                message: format!("line without separator: `{trimmed}`"),
            });
        };
        items.push(InterpreterItem {
            version: version.trim().to_string(),
            path: PathBuf::from(exe.trim()),
        });
    }
    Ok(items)
}

/// What: Rebuild the interpreter cache wholesale and persist it.
///
/// Inputs:
/// - `ctx`: Discovery context (store receives the rebuilt file).
///
/// Output:
/// - The discovered interpreters, probe hits first, then the running
///   interpreter appended when it is not already present.
pub fn rebuild_cache(ctx: &Context) -> Result<Vec<InterpreterItem>> {
    let mut items = probe_interpreters();
    if let Some(current) = running_interpreter()
        && !items.iter().any(|i| i.path == current.path)
    {
        items.push(current);
    }
    ctx.store.save(CACHE_FILE, &render_cache(&items))?;
    tracing::info!(count = items.len(), "interpreter cache rebuilt");
    Ok(items)
}

/// What: Load cached interpreters, rebuilding when the cache is absent.
///
/// Inputs:
/// - `ctx`: Discovery context.
///
/// Output:
/// - Cached items, or a freshly rebuilt list on a missing cache file.
///
/// Errors:
/// - `MalformedCache` when the file exists but cannot be understood.
pub fn load_or_rebuild(ctx: &Context) -> Result<Vec<InterpreterItem>> {
    match ctx.store.load(CACHE_FILE)? {
        Some(contents) => parse_cache(&contents, &PathBuf::from(CACHE_FILE)),
        None => rebuild_cache(ctx),
    }
}
