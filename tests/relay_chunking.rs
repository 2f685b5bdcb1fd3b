//! Integration tests for output relay chunking and failure classification.

use venvman::exec::{ConsoleEvent, FailurePolicy, OutputRelay, StreamKind};

/// Collect the `Line` texts for one stream from an event list.
fn line_texts(events: &[ConsoleEvent], which: StreamKind) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            ConsoleEvent::Line { stream, text } if *stream == which => Some(text.clone()),
            _ => None,
        })
        .collect()
}

/// Run a payload through a fresh relay with the given chunk sizes repeating.
fn relay_with_chunks(payload: &[u8], sizes: &[usize], policy: FailurePolicy) -> Vec<ConsoleEvent> {
    let mut relay = OutputRelay::new(policy);
    let mut events = Vec::new();
    let mut offset = 0;
    let mut size_idx = 0;
    while offset < payload.len() {
        let size = sizes[size_idx % sizes.len()].max(1);
        size_idx += 1;
        let end = (offset + size).min(payload.len());
        events.extend(
            relay
                .on_chunk(StreamKind::Stdout, &payload[offset..end])
                .events,
        );
        offset = end;
    }
    events.extend(relay.finish());
    events
}

#[test]
/// What: Line reassembly is insensitive to chunk boundaries.
///
/// Inputs:
/// - A multi-line payload with multi-byte characters, split with several
///   different chunk-size patterns including single bytes.
///
/// Output:
/// - Every chunking produces the identical line sequence.
fn relay_chunkings_produce_identical_lines() {
    let payload =
        "Collecting example-pkg\n  Downloading example_pkg-1.0-py3-none-any.whl (10 kB)\nInstalling collected packages: example-pkg (ßπø)\nSuccessfully installed example-pkg-1.0\n"
            .as_bytes();
    let reference = relay_with_chunks(payload, &[payload.len()], FailurePolicy::Strict);
    let reference_lines = line_texts(&reference, StreamKind::Stdout);
    assert_eq!(reference_lines.len(), 4);

    for sizes in [&[1_usize][..], &[2, 3][..], &[7][..], &[5, 1, 13][..]] {
        let events = relay_with_chunks(payload, sizes, FailurePolicy::Strict);
        assert_eq!(line_texts(&events, StreamKind::Stdout), reference_lines);
    }
}

#[test]
/// What: Strict policy raises exactly one failure across many stderr chunks.
///
/// Inputs:
/// - Three stderr chunks interleaved with stdout output.
///
/// Output:
/// - One `Failed` event total; the first stderr chunk requests the stop;
///   stdout lines keep flowing through the relay untouched.
fn relay_strict_single_failure_across_chunks() {
    let mut relay = OutputRelay::new(FailurePolicy::Strict);
    let mut events = Vec::new();
    let mut stops = 0;

    let out = relay.on_chunk(StreamKind::Stdout, b"Collecting example-pkg\n");
    events.extend(out.events);
    for chunk in [
        b"ERROR: HTTP 404\n".as_slice(),
        b"while fetching\n".as_slice(),
        b"giving up\n".as_slice(),
    ] {
        let out = relay.on_chunk(StreamKind::Stderr, chunk);
        if out.stop_requested {
            stops += 1;
        }
        events.extend(out.events);
    }
    events.extend(relay.finish());

    let failures: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, ConsoleEvent::Failed { .. }))
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(stops, 1);
    assert_eq!(
        line_texts(&events, StreamKind::Stdout),
        vec!["Collecting example-pkg".to_string()]
    );
    assert_eq!(line_texts(&events, StreamKind::Stderr).len(), 3);
}

#[test]
/// What: Exit-code-only policy never fails on stderr alone.
///
/// Inputs:
/// - A warning-heavy stderr stream under the lenient policy.
///
/// Output:
/// - All lines relayed, no failure, no stop request, `has_failed` false.
fn relay_exit_code_only_never_fails_on_stderr() {
    let mut relay = OutputRelay::new(FailurePolicy::ExitCodeOnly);
    let out = relay.on_chunk(
        StreamKind::Stderr,
        b"WARNING: Retrying after connection broken\nWARNING: pip is out of date\n",
    );
    assert!(!out.stop_requested);
    assert!(!relay.has_failed());
    assert_eq!(line_texts(&out.events, StreamKind::Stderr).len(), 2);
}

#[test]
/// What: Accumulated stream text is kept for the outcome record.
///
/// Inputs:
/// - Split stdout and stderr chunks.
///
/// Output:
/// - `stdout_text`/`stderr_text` contain the full decoded streams.
fn relay_accumulates_full_stream_text() {
    let mut relay = OutputRelay::new(FailurePolicy::ExitCodeOnly);
    let _ = relay.on_chunk(StreamKind::Stdout, b"alpha\nbe");
    let _ = relay.on_chunk(StreamKind::Stdout, b"ta\n");
    let _ = relay.on_chunk(StreamKind::Stderr, b"warn\n");
    assert_eq!(relay.stdout_text(), "alpha\nbeta\n");
    assert_eq!(relay.stderr_text(), "warn\n");
}
