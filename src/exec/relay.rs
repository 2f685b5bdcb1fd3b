//! Line-oriented relay between raw process output and a console sink.
//!
//! The relay decodes byte chunks per stream into UTF-8 text, tolerating
//! multi-byte sequences split across chunk boundaries, splits the text into
//! logical lines, strips ANSI escapes, and classifies error-stream output
//! according to the configured failure policy. Forwarding happens on chunk
//! delivery; nothing is buffered until process exit.

use crate::exec::runner::StreamKind;

/// How error-stream output from a managed tool is classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any stderr output is fatal for the current action: the relay raises
    /// one `Failed` event and requests the runner be stopped. This is the
    /// default; pip is known to write non-fatal warnings to stderr, which
    /// this policy deliberately treats as failures.
    Strict,
    /// stderr is relayed as ordinary output; only a non-zero exit status
    /// fails the action.
    ExitCodeOnly,
}

/// Console-facing event produced by the relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// One complete output line, ANSI-stripped.
    Line {
        /// Stream the line arrived on.
        stream: StreamKind,
        /// Line text without the trailing newline.
        text: String,
    },
    /// The action failed; raised at most once per run.
    Failed {
        /// First decoded error text, surfaced verbatim.
        message: String,
    },
}

/// What the relay wants done after processing one chunk.
#[derive(Debug, Default)]
pub struct RelayOutput {
    /// Events to forward to the console sink, in order.
    pub events: Vec<ConsoleEvent>,
    /// Whether the producing runner should be stopped.
    pub stop_requested: bool,
}

/// Per-stream reassembly state.
#[derive(Default)]
struct StreamAssembler {
    /// Raw bytes not yet decoded (possible split UTF-8 sequence at the end).
    bytes: Vec<u8>,
    /// Decoded text of the current unterminated line.
    line: String,
    /// All decoded text seen on this stream.
    accumulated: String,
}

impl StreamAssembler {
    /// What: Absorb a chunk and return completed lines.
    ///
    /// Details:
    /// - Tries a full UTF-8 decode first; on failure trims up to three
    ///   trailing bytes (a split sequence) and retries, falling back to a
    ///   lossy decode for genuinely invalid input.
    fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.bytes.extend_from_slice(chunk);
        let mut lines = Vec::new();
        match std::str::from_utf8(&self.bytes) {
            Ok(text) => {
                let text = text.to_string();
                self.bytes.clear();
                self.push_text(&text, &mut lines);
            }
            Err(e) => {
                let valid = e.valid_up_to();
                if self.bytes.len() - valid < 4 {
                    // A short tail can be an incomplete sequence; keep it for
                    // the next chunk and emit the valid prefix now.
                    if valid > 0 {
                        let text = String::from_utf8_lossy(&self.bytes[..valid]).into_owned();
                        self.bytes.drain(..valid);
                        self.push_text(&text, &mut lines);
                    }
                } else {
                    // Genuinely invalid input: decode lossily and move on.
                    let text = String::from_utf8_lossy(&self.bytes).into_owned();
                    self.bytes.clear();
                    self.push_text(&text, &mut lines);
                }
            }
        }
        lines
    }

    /// What: Split decoded text into completed lines.
    fn push_text(&mut self, text: &str, lines: &mut Vec<String>) {
        self.accumulated.push_str(text);
        for ch in text.chars() {
            match ch {
                '\n' | '\r' => {
                    if !self.line.trim().is_empty() {
                        lines.push(strip_ansi_escapes::strip_str(&self.line));
                    }
                    self.line.clear();
                }
                _ => self.line.push(ch),
            }
        }
    }

    /// What: Flush any unterminated final line.
    fn take_remainder(&mut self) -> Option<String> {
        if self.line.trim().is_empty() {
            self.line.clear();
            return None;
        }
        let cleaned = strip_ansi_escapes::strip_str(&self.line);
        self.line.clear();
        Some(cleaned)
    }
}

/// Decodes process output chunks and forwards them as line events.
pub struct OutputRelay {
    /// Active failure policy.
    policy: FailurePolicy,
    /// stdout reassembly state.
    stdout: StreamAssembler,
    /// stderr reassembly state.
    stderr: StreamAssembler,
    /// Whether `Failed` has already been raised for this run.
    failed: bool,
}

impl OutputRelay {
    /// What: Create a relay with the given failure policy.
    #[must_use]
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            stdout: StreamAssembler::default(),
            stderr: StreamAssembler::default(),
            failed: false,
        }
    }

    /// What: Process one raw chunk from the runner.
    ///
    /// Inputs:
    /// - `stream`: Which stream the chunk arrived on.
    /// - `chunk`: Raw bytes, possibly ending mid-UTF-8-sequence or mid-line.
    ///
    /// Output:
    /// - Line events in arrival order, plus at most one `Failed` event and a
    ///   stop request when the strict policy sees stderr output.
    pub fn on_chunk(&mut self, stream: StreamKind, chunk: &[u8]) -> RelayOutput {
        let mut out = RelayOutput::default();
        let assembler = match stream {
            StreamKind::Stdout => &mut self.stdout,
            StreamKind::Stderr => &mut self.stderr,
        };
        for text in assembler.push_chunk(chunk) {
            out.events.push(ConsoleEvent::Line {
                stream,
                text,
            });
        }
        if stream == StreamKind::Stderr
            && self.policy == FailurePolicy::Strict
            && !chunk.is_empty()
            && !self.failed
        {
            self.failed = true;
            let message = first_nonempty_line(&self.stderr.accumulated)
                .unwrap_or_else(|| "tool wrote to the error stream".to_string());
            out.events.push(ConsoleEvent::Failed { message });
            out.stop_requested = true;
        }
        out
    }

    /// What: Flush unterminated final lines when the process finishes.
    ///
    /// Output:
    /// - Zero, one, or two trailing line events (stdout first).
    pub fn finish(&mut self) -> Vec<ConsoleEvent> {
        let mut events = Vec::new();
        if let Some(text) = self.stdout.take_remainder() {
            events.push(ConsoleEvent::Line {
                stream: StreamKind::Stdout,
                text,
            });
        }
        if let Some(text) = self.stderr.take_remainder() {
            events.push(ConsoleEvent::Line {
                stream: StreamKind::Stderr,
                text,
            });
        }
        events
    }

    /// What: Whether a `Failed` event has been raised for this run.
    #[must_use]
    pub const fn has_failed(&self) -> bool {
        self.failed
    }

    /// What: All text seen on stdout so far.
    #[must_use]
    pub fn stdout_text(&self) -> &str {
        &self.stdout.accumulated
    }

    /// What: All text seen on stderr so far.
    #[must_use]
    pub fn stderr_text(&self) -> &str {
        &self.stderr.accumulated
    }
}

/// What: First line of `text` with non-whitespace content.
fn first_nonempty_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| strip_ansi_escapes::strip_str(l))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collect only the `Line` texts for one stream from a relay output set.
    fn line_texts(events: &[ConsoleEvent], which: StreamKind) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                ConsoleEvent::Line { stream, text } if *stream == which => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    /// What: Lines reassemble identically regardless of chunk boundaries.
    ///
    /// Inputs:
    /// - The same multi-line, multi-byte payload delivered whole, split at
    ///   every byte, and split mid-UTF-8-sequence.
    ///
    /// Output:
    /// - Identical line sequences for every chunking.
    fn relay_chunk_boundary_insensitivity() {
        let payload = "Collecting example-pkg\nInstalling collected packages: π\ndone\n";
        let expected = vec![
            "Collecting example-pkg".to_string(),
            "Installing collected packages: π".to_string(),
            "done".to_string(),
        ];

        // Whole payload at once.
        let mut whole = OutputRelay::new(FailurePolicy::Strict);
        let mut events = whole.on_chunk(StreamKind::Stdout, payload.as_bytes()).events;
        events.extend(whole.finish());
        assert_eq!(line_texts(&events, StreamKind::Stdout), expected);

        // One byte at a time (splits the two-byte π sequence).
        let mut tiny = OutputRelay::new(FailurePolicy::Strict);
        let mut events = Vec::new();
        for b in payload.as_bytes() {
            events.extend(tiny.on_chunk(StreamKind::Stdout, &[*b]).events);
        }
        events.extend(tiny.finish());
        assert_eq!(line_texts(&events, StreamKind::Stdout), expected);
    }

    #[test]
    /// What: Strict policy classifies the first stderr chunk as fatal, once.
    ///
    /// Inputs:
    /// - Two stderr chunks on a strict relay.
    ///
    /// Output:
    /// - Exactly one `Failed` event with the first error line verbatim; the
    ///   first chunk requests a stop, the second does not re-raise.
    fn relay_strict_policy_fails_once_and_requests_stop() {
        let mut relay = OutputRelay::new(FailurePolicy::Strict);
        let out = relay.on_chunk(StreamKind::Stderr, b"ERROR: no matching distribution\n");
        assert!(out.stop_requested);
        let failures: Vec<_> = out
            .events
            .iter()
            .filter(|e| matches!(e, ConsoleEvent::Failed { .. }))
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0],
            &ConsoleEvent::Failed {
                message: "ERROR: no matching distribution".to_string()
            }
        );

        let out2 = relay.on_chunk(StreamKind::Stderr, b"more\n");
        assert!(!out2.stop_requested);
        assert!(
            out2.events
                .iter()
                .all(|e| !matches!(e, ConsoleEvent::Failed { .. }))
        );
        assert!(relay.has_failed());
    }

    #[test]
    /// What: Exit-code-only policy relays stderr as ordinary lines.
    ///
    /// Inputs:
    /// - A stderr warning chunk on an exit-code-only relay.
    ///
    /// Output:
    /// - The line is forwarded; no failure, no stop request.
    fn relay_exit_code_only_passes_warnings_through() {
        let mut relay = OutputRelay::new(FailurePolicy::ExitCodeOnly);
        let out = relay.on_chunk(StreamKind::Stderr, b"WARNING: pip is out of date\n");
        assert!(!out.stop_requested);
        assert_eq!(
            line_texts(&out.events, StreamKind::Stderr),
            vec!["WARNING: pip is out of date".to_string()]
        );
        assert!(!relay.has_failed());
    }

    #[test]
    /// What: ANSI escapes are stripped from forwarded lines.
    ///
    /// Inputs:
    /// - A colored stdout line.
    ///
    /// Output:
    /// - The forwarded text has no escape bytes; accumulated text keeps the
    ///   raw stream for the outcome record.
    fn relay_strips_ansi_escapes_from_lines() {
        let mut relay = OutputRelay::new(FailurePolicy::Strict);
        let out = relay.on_chunk(StreamKind::Stdout, b"\x1b[32mSuccessfully installed\x1b[0m\n");
        assert_eq!(
            line_texts(&out.events, StreamKind::Stdout),
            vec!["Successfully installed".to_string()]
        );
    }

    #[test]
    /// What: An unterminated final line is flushed by `finish`.
    ///
    /// Inputs:
    /// - A stdout chunk without a trailing newline.
    ///
    /// Output:
    /// - No line event on delivery; one line event from `finish`.
    fn relay_finish_flushes_remainder() {
        let mut relay = OutputRelay::new(FailurePolicy::Strict);
        let out = relay.on_chunk(StreamKind::Stdout, b"partial tail");
        assert!(out.events.is_empty());
        let tail = relay.finish();
        assert_eq!(
            tail,
            vec![ConsoleEvent::Line {
                stream: StreamKind::Stdout,
                text: "partial tail".to_string()
            }]
        );
    }
}
