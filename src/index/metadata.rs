//! Per-environment metadata persistence (`venvman.json`).
//!
//! The metadata record lets several external project checkouts reference
//! one shared environment: it carries the owning directory, the name, a
//! free-text comment, and the associated project directories.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::state::VenvMetadata;

/// Metadata file name inside an environment directory.
pub const METADATA_FILE: &str = "venvman.json";

/// What: Path of the metadata file for an environment root.
#[must_use]
pub fn metadata_path(env_root: &Path) -> PathBuf {
    env_root.join(METADATA_FILE)
}

/// What: Load the metadata record of an environment.
///
/// Output:
/// - `Ok(None)` when no record exists yet.
///
/// Errors:
/// - `Json` when a record exists but cannot be parsed; a corrupt record
///   fails loud rather than being silently replaced.
pub fn load_metadata(env_root: &Path) -> Result<Option<VenvMetadata>> {
    match std::fs::read_to_string(metadata_path(env_root)) {
        Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// What: Persist the metadata record of an environment.
pub fn save_metadata(env_root: &Path, meta: &VenvMetadata) -> Result<()> {
    let body = serde_json::to_string_pretty(meta)?;
    std::fs::write(metadata_path(env_root), body)?;
    Ok(())
}

/// What: Associate an external project directory with an environment.
///
/// Inputs:
/// - `env_root`: Environment directory.
/// - `name`: Environment name (used when creating a fresh record).
/// - `project_dir`: Checkout to associate.
///
/// Output:
/// - The updated record. Adding an already-associated directory is a no-op.
pub fn attach_project(env_root: &Path, name: &str, project_dir: &Path) -> Result<VenvMetadata> {
    let mut meta = load_metadata(env_root)?.unwrap_or_else(|| VenvMetadata {
        directory: env_root.parent().map(Path::to_path_buf).unwrap_or_default(),
        name: name.to_string(),
        ..VenvMetadata::default()
    });
    if !meta.project_dirs.iter().any(|d| d == project_dir) {
        meta.project_dirs.push(project_dir.to_path_buf());
        save_metadata(env_root, &meta)?;
    }
    Ok(meta)
}
