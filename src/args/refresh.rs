//! Command-line interpreter cache refresh.

use crate::args::utils::{discovery_context, resolve_settings};
use crate::index::interpreters;

/// What: Handle `--refresh` by rebuilding the interpreter cache wholesale.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Prints the refreshed count and returns so any further requested action
///   runs against the fresh cache; exits 1 when the rebuild fails.
pub fn handle_refresh(args: &crate::args::Args) {
    let ctx = discovery_context(resolve_settings(args));
    match interpreters::rebuild_cache(&ctx) {
        Ok(items) => {
            println!("Interpreter cache refreshed: {} found", items.len());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            tracing::error!(error = %e, "interpreter cache rebuild failed");
            std::process::exit(1);
        }
    }
}
