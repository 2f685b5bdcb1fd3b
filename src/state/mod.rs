//! Application state: value types shared across discovery, orchestration,
//! and the CLI surface.

pub mod types;

pub use types::{EnvironmentItem, InterpreterItem, SitePackages, VenvMetadata};
