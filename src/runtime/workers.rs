//! Background worker executing queued actions.

use tokio::sync::mpsc;

use crate::config::Settings;
use crate::exec::{EnvLocks, Orchestrator};
use crate::runtime::channels::{ActionOutput, ActionRequest};

/// What: Spawn the background worker that executes queued actions.
///
/// Inputs:
/// - `settings`: Resolved settings for the worker's orchestrator.
/// - `action_req_rx`: Channel receiver for action requests.
/// - `action_res_tx`: Channel sender for per-action output.
///
/// Details:
/// - Actions are executed strictly in queue order; console events stream
///   while the action runs, then exactly one `Succeeded` or `Failed`
///   closes it out.
pub fn spawn_executor_worker(
    settings: Settings,
    mut action_req_rx: mpsc::UnboundedReceiver<ActionRequest>,
    action_res_tx: mpsc::UnboundedSender<ActionOutput>,
) {
    tokio::spawn(async move {
        let orchestrator = Orchestrator::new(settings, EnvLocks::new());
        tracing::debug!("executor worker started, waiting for requests");
        while let Some(request) = action_req_rx.recv().await {
            let console_tx = action_res_tx.clone();
            let mut sink = move |event: crate::exec::ConsoleEvent| {
                let _ = console_tx.send(ActionOutput::Console(event));
            };
            match orchestrator.run(&request.action, &mut sink).await {
                Ok(outcome) => {
                    let _ = action_res_tx.send(ActionOutput::Succeeded { outcome });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "action failed");
                    let _ = action_res_tx.send(ActionOutput::Failed {
                        message: e.to_string(),
                    });
                }
            }
        }
        tracing::debug!("executor worker exiting (channel closed)");
    });
}
