//! Non-blocking single-command process runner.
//!
//! One runner launches exactly one external command with piped stdio and
//! reports its lifecycle as events on a channel: `Started`, interleaved
//! `Output` chunks for each stream, and exactly one `Finished` once the
//! child exits. Process I/O happens on blocking reader threads; the
//! consuming side only ever sees the event channel.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

/// Which output stream a chunk arrived on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// Lifecycle event of one command run.
#[derive(Clone, Debug)]
pub enum RunnerEvent {
    /// The child process is confirmed running.
    Started,
    /// A raw output chunk, in arrival order within its stream.
    Output {
        /// Stream the chunk arrived on.
        stream: StreamKind,
        /// Raw bytes as read from the pipe.
        bytes: Vec<u8>,
    },
    /// The child exited. Fires exactly once per launched command; `code` is
    /// `-1` when the process was killed by a signal.
    Finished {
        /// Exit code or `-1` sentinel.
        code: i32,
    },
    /// The command could not be spawned at all; `Started` never fires.
    SpawnFailed {
        /// OS error text naming the missing prerequisite.
        message: String,
    },
}

/// One command line plus the directory it runs in.
#[derive(Clone, Debug)]
pub struct ExecRequest {
    /// Shell command string (non-empty).
    pub command: String,
    /// Working directory; must exist at spawn time.
    pub cwd: PathBuf,
}

/// Handle controlling one launched command.
///
/// `stop` is best-effort: after it returns, no further `Output` events are
/// delivered, but the OS process may still be exiting. A bounded grace
/// period separates the polite termination request from a forced kill.
pub struct ProcessRunner {
    /// Set by `stop()`; checked before every event forward.
    stop: Arc<AtomicBool>,
    /// Grace period between a stop request and a forced kill.
    kill_grace: Duration,
}

impl ProcessRunner {
    /// What: Create a runner with the given stop-to-kill grace period.
    #[must_use]
    pub fn new(kill_grace: Duration) -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            kill_grace,
        }
    }

    /// What: Launch `req` and stream its lifecycle to `events_tx`.
    ///
    /// Inputs:
    /// - `req`: Command string and working directory.
    /// - `events_tx`: Channel receiving `RunnerEvent`s.
    ///
    /// Details:
    /// - Runs the blocking process loop under `spawn_blocking`; returns
    ///   immediately. Event order per run: `Started`, zero or more `Output`,
    ///   exactly one `Finished`; or a single `SpawnFailed`.
    pub fn spawn(&self, req: ExecRequest, events_tx: mpsc::UnboundedSender<RunnerEvent>) {
        let stop = Arc::clone(&self.stop);
        let grace = self.kill_grace;
        tokio::task::spawn_blocking(move || {
            execute_command(&req, &stop, grace, &events_tx);
        });
    }

    /// What: Request termination of the running command.
    ///
    /// Details:
    /// - Fire-and-forget: sets the stop flag and returns. The process loop
    ///   sends a polite termination signal, then escalates to a forced kill
    ///   after the grace period. No `Output` events are delivered after this
    ///   returns.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// What: Whether `stop()` has been requested.
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// What: Spawn a reader thread forwarding one pipe into the data channel.
///
/// Inputs:
/// - `reader`: Pipe end to drain.
/// - `stream`: Stream tag attached to every chunk.
/// - `data_tx`: Channel receiving `(stream, bytes)` pairs.
///
/// Details:
/// - Reads in 4KB chunks; sends an empty chunk on EOF so the processing
///   loop can count stream completions.
fn spawn_pipe_reader_thread(
    reader: impl std::io::Read + Send + 'static,
    stream: StreamKind,
    data_tx: std::sync::mpsc::Sender<(StreamKind, Vec<u8>)>,
) {
    std::thread::spawn(move || {
        let mut reader = reader;
        loop {
            let mut buf = [0u8; 4096];
            match std::io::Read::read(&mut reader, &mut buf) {
                Ok(0) => {
                    let _ = data_tx.send((stream, Vec::new()));
                    break;
                }
                Ok(n) => {
                    if data_tx.send((stream, buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    if e.kind() != std::io::ErrorKind::Interrupted {
                        tracing::debug!(?stream, error = %e, "pipe read error");
                        let _ = data_tx.send((stream, Vec::new()));
                        break;
                    }
                }
            }
        }
    });
}

/// What: Send a polite termination signal to the child.
///
/// Details:
/// - SIGTERM on unix so the tool can clean up; on other targets the forced
///   kill is the only option and happens at escalation time.
#[cfg(unix)]
fn request_termination(child: &std::process::Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;
    if let Ok(pid) = i32::try_from(child.id()) {
        let _ = kill(Pid::from_raw(pid), Signal::SIGTERM);
    }
}

#[cfg(not(unix))]
/// No polite signal exists off-unix; escalation performs the kill.
const fn request_termination(_child: &std::process::Child) {}

/// What: Run one command to completion, streaming output and honoring stop.
///
/// Inputs:
/// - `req`: Command string and working directory.
/// - `stop`: Stop flag shared with the [`ProcessRunner`] handle.
/// - `grace`: Stop-to-kill grace period.
/// - `events_tx`: Event channel.
///
/// Details:
/// - Validates the request, spawns the platform shell, forwards chunks from
///   two reader threads, polls the child with `try_wait`, and emits exactly
///   one `Finished` (or one `SpawnFailed`). Output forwarding is suppressed
///   as soon as the stop flag is observed.
#[allow(clippy::cognitive_complexity)] // one linear process loop, split points would obscure it
fn execute_command(
    req: &ExecRequest,
    stop: &Arc<AtomicBool>,
    grace: Duration,
    events_tx: &mpsc::UnboundedSender<RunnerEvent>,
) {
    if req.command.trim().is_empty() {
        let _ = events_tx.send(RunnerEvent::SpawnFailed {
            message: "empty command".to_string(),
        });
        return;
    }
    if !req.cwd.is_dir() {
        let _ = events_tx.send(RunnerEvent::SpawnFailed {
            message: format!("working directory {} does not exist", req.cwd.display()),
        });
        return;
    }

    // bash rather than sh: the activation wrapper relies on `source`.
    #[cfg(not(target_os = "windows"))]
    let mut command = {
        let mut c = std::process::Command::new("bash");
        c.arg("-c").arg(&req.command);
        c
    };
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = std::process::Command::new("cmd");
        c.arg("/C").arg(&req.command);
        c
    };

    let mut child = match command
        .current_dir(&req.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            tracing::error!(error = %e, "failed to spawn shell");
            let _ = events_tx.send(RunnerEvent::SpawnFailed {
                message: e.to_string(),
            });
            return;
        }
    };

    let _ = events_tx.send(RunnerEvent::Started);
    tracing::debug!(pid = child.id(), "child started");

    let (data_tx, data_rx) = std::sync::mpsc::channel::<(StreamKind, Vec<u8>)>();
    if let Some(stdout) = child.stdout.take() {
        spawn_pipe_reader_thread(stdout, StreamKind::Stdout, data_tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_pipe_reader_thread(stderr, StreamKind::Stderr, data_tx.clone());
    }
    drop(data_tx);

    let mut eof_count: u8 = 0;
    let mut stop_seen_at: Option<Instant> = None;
    let mut killed = false;

    let code = loop {
        // Honor a stop request: polite signal first, forced kill after grace.
        if stop.load(Ordering::SeqCst) {
            if let Some(since) = stop_seen_at {
                if !killed && since.elapsed() >= grace {
                    tracing::warn!(pid = child.id(), "grace period elapsed; killing child");
                    let _ = child.kill();
                    killed = true;
                }
            } else {
                tracing::info!(pid = child.id(), "stop requested; signaling child");
                request_termination(&child);
                stop_seen_at = Some(Instant::now());
            }
        }

        match child.try_wait() {
            Ok(Some(status)) => break exit_code_of(status),
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "child status poll failed");
                let _ = child.kill();
                break -1;
            }
        }

        match data_rx.recv_timeout(Duration::from_millis(50)) {
            Ok((stream, bytes)) => {
                if bytes.is_empty() {
                    eof_count += 1;
                } else if !stop.load(Ordering::SeqCst) {
                    let _ = events_tx.send(RunnerEvent::Output { stream, bytes });
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                // Both readers are gone; wait for the child to settle.
                match child.wait() {
                    Ok(status) => break exit_code_of(status),
                    Err(e) => {
                        tracing::error!(error = %e, "child wait failed");
                        break -1;
                    }
                }
            }
        }
    };

    // Drain buffered output that arrived before the exit was observed.
    while eof_count < 2 {
        match data_rx.recv_timeout(Duration::from_millis(100)) {
            Ok((stream, bytes)) => {
                if bytes.is_empty() {
                    eof_count += 1;
                } else if !stop.load(Ordering::SeqCst) {
                    let _ = events_tx.send(RunnerEvent::Output { stream, bytes });
                }
            }
            Err(_) => break,
        }
    }

    tracing::debug!(code, "child finished");
    let _ = events_tx.send(RunnerEvent::Finished { code });
}

/// What: Exit code of a finished child, `-1` when killed by a signal.
fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
