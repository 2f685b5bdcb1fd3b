//! Core value types used by venvman state.

use std::path::PathBuf;

/// Site-packages isolation mode of a virtual environment.
///
/// Indicates whether the environment sees only its own package set or also
/// the interpreter's global site-packages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SitePackages {
    /// Only the environment's own packages are visible.
    Isolated,
    /// Global site-packages are visible inside the environment.
    Global,
}

/// Minimal summary of one discovered virtual environment.
///
/// This is compact enough to render in list output. It is recomputed on
/// every scan of the base directory and never persisted.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EnvironmentItem {
    /// Environment name (the directory name under the base directory).
    pub name: String,
    /// Parent directory the environment lives under.
    pub base_dir: PathBuf,
    /// Interpreter version string recorded in the descriptor (e.g. `3.12.4`).
    pub version: String,
    /// Site-packages isolation mode from the descriptor.
    pub site_packages: SitePackages,
    /// Interpreter `home` directory recorded in the descriptor.
    pub interpreter_home: PathBuf,
    /// Whether the recorded interpreter is present on this machine, derived
    /// by matching `interpreter_home` against the cached interpreter list.
    pub interpreter_present: bool,
}

impl EnvironmentItem {
    /// What: Absolute path of the environment directory.
    ///
    /// Output:
    /// - `base_dir` joined with `name`.
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.base_dir.join(&self.name)
    }
}

/// One discovered Python executable.
///
/// Produced by probing a fixed set of candidate version suffixes plus the
/// running interpreter; persisted to the flat CSV cache and rebuilt
/// wholesale on refresh.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InterpreterItem {
    /// Version string as reported by `--version` (e.g. `3.12.4`).
    pub version: String,
    /// Absolute path of the executable.
    pub path: PathBuf,
}

/// Per-environment metadata record, serialized as `venvman.json` inside the
/// environment directory.
///
/// Lets multiple external project checkouts reference one shared
/// environment.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct VenvMetadata {
    /// Owning base directory of the environment.
    pub directory: PathBuf,
    /// Environment name.
    pub name: String,
    /// Free-text comment.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    /// External project directories associated with this environment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub project_dirs: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Environment root is the base directory joined with the name.
    ///
    /// Inputs:
    /// - An item under `/tmp/envs` named `envA`.
    ///
    /// Output:
    /// - `root()` returns `/tmp/envs/envA`.
    fn types_environment_root_joins_base_and_name() {
        let item = EnvironmentItem {
            name: "envA".into(),
            base_dir: PathBuf::from("/tmp/envs"),
            version: "3.12.4".into(),
            site_packages: SitePackages::Isolated,
            interpreter_home: PathBuf::from("/usr/bin"),
            interpreter_present: true,
        };
        assert_eq!(item.root(), PathBuf::from("/tmp/envs/envA"));
    }

    #[test]
    /// What: Metadata round-trips through JSON with empty fields elided.
    ///
    /// Inputs:
    /// - A record without comment or project directories.
    ///
    /// Output:
    /// - Serialized JSON omits the empty fields; deserialization restores
    ///   defaults.
    fn types_metadata_json_elides_empty_fields() {
        let meta = VenvMetadata {
            directory: PathBuf::from("/tmp/envs"),
            name: "envA".into(),
            comment: String::new(),
            project_dirs: Vec::new(),
        };
        let json = serde_json::to_string(&meta).expect("serialize");
        assert!(!json.contains("comment"));
        assert!(!json.contains("project_dirs"));
        let back: VenvMetadata = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.name, "envA");
        assert!(back.comment.is_empty());
        assert!(back.project_dirs.is_empty());
    }
}
