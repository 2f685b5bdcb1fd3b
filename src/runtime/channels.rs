//! Channel definitions for runtime communication.

use tokio::sync::mpsc;

use crate::config::Settings;
use crate::exec::{Action, ConsoleEvent, ExecOutcome};

/// One queued user-level action.
#[derive(Clone, Debug)]
pub struct ActionRequest {
    /// Action to perform.
    pub action: Action,
}

/// Output of the executor worker, streamed per action.
#[derive(Clone, Debug)]
pub enum ActionOutput {
    /// A console event (line or failure notification) from the running
    /// action.
    Console(ConsoleEvent),
    /// The action completed successfully; fires exactly once per request.
    Succeeded {
        /// Final process record.
        outcome: ExecOutcome,
    },
    /// The action failed; fires exactly once per request, mutually
    /// exclusive with `Succeeded`.
    Failed {
        /// User-facing failure text.
        message: String,
    },
}

/// What: Channel endpoints used for communication with the executor worker.
///
/// Details:
/// - Contains the request sender and response receiver retained by the
///   caller; the worker holds the opposite ends.
pub struct Channels {
    /// Queue of actions for the executor worker.
    pub action_req_tx: mpsc::UnboundedSender<ActionRequest>,
    /// Stream of per-action output and completions.
    pub action_res_rx: mpsc::UnboundedReceiver<ActionOutput>,
}

impl Channels {
    /// What: Create the runtime channels and spawn the executor worker.
    ///
    /// Inputs:
    /// - `settings`: Resolved settings handed to the worker's orchestrator.
    ///
    /// Output:
    /// - A `Channels` struct with the caller-side endpoints.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let (action_req_tx, action_req_rx) = mpsc::unbounded_channel::<ActionRequest>();
        let (action_res_tx, action_res_rx) = mpsc::unbounded_channel::<ActionOutput>();

        crate::runtime::workers::spawn_executor_worker(settings, action_req_rx, action_res_tx);

        Self {
            action_req_tx,
            action_res_rx,
        }
    }
}
