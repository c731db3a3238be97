#[path = "common/mod.rs"]
mod common;

use common::*;
use parmap::{
    BoundedParallelMapper, CollectingSink, DiagnosticSink, FailureKind, Tee, TracingSink, BACKTRACE_NOT_CAPTURED,
};
use std::sync::Arc;

/// Diagnostics fan out through a `Tee`, and every run flushes its sink once.
#[test]
fn tee_forwards_failures_and_flushes() {
    let a = Arc::new(CollectingSink::new());
    let b = Arc::new(CollectingSink::new());
    let sinks: Vec<Arc<dyn DiagnosticSink>> = vec![a.clone(), b.clone(), Arc::new(TracingSink)];
    let mapper = BoundedParallelMapper::new()
        .chunk_size(50)
        .progress(false)
        .sink(Arc::new(Tee(sinks)));
    let data = input(1_000);

    mapper.map(affine_chunk_failing(500), &affine_args(), &data).unwrap();
    mapper.map(affine_chunk_failing(500), &affine_args(), &data).unwrap();

    assert_eq!(a.len(), 4, "two failing chunks per run, two runs");
    assert_eq!(a.entries(), b.entries());
    assert_eq!(a.flush_count(), 2);
    assert_eq!(b.flush_count(), 2);
}

/// Error diagnostics carry the full cause chain in the trace.
#[test]
fn error_trace_includes_context_chain() {
    use anyhow::Context;

    let (mapper, sink) = quiet_mapper(2, 5);
    let data = input(20);

    mapper
        .map(
            |chunk: &[u64], _: &()| -> anyhow::Result<Vec<u64>> {
                if chunk.contains(&7) {
                    return Err(anyhow::anyhow!("disk on fire")).context("loading item 7");
                }
                Ok(chunk.to_vec())
            },
            &(),
            &data,
        )
        .unwrap();

    let failures = sink.take();
    assert_eq!(failures.len(), 1);
    let f = &failures[0];
    assert_eq!(f.kind, FailureKind::Error);
    assert_eq!((f.chunk, f.offset, f.len), (1, 5, 5));
    assert!(f.message.contains("loading item 7") && f.message.contains("disk on fire"));
    assert!(f.trace.contains("Caused by"), "trace: {}", f.trace);
    assert!(sink.is_empty(), "take() drains the sink");

    let shown = f.to_string();
    assert!(shown.starts_with("chunk 1 (items 5..10) failed:"), "display: {shown}");
}

#[test]
fn failures_serialize_to_json() {
    let (mapper, sink) = quiet_mapper(1, 1);
    let data = input(3);
    mapper.map(affine_chunk_failing(2), &affine_args(), &data).unwrap();

    let entries = sink.entries();
    assert_eq!(entries.len(), 2);
    let v = serde_json::to_value(&entries[0]).unwrap();
    assert_eq!(v["kind"], "error");
    assert!(v["message"].as_str().unwrap().contains("multiple of 2"));
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<parking_lot::Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CapturedLog {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

/// The default sink writes exactly one INFO event per failed chunk, each carrying
/// the trace field, and the run adds nothing else at INFO or above.
#[test]
fn default_sink_logs_one_info_event_per_failed_chunk() {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .without_time()
        .finish();

    let mapper = BoundedParallelMapper::new().workers(8).chunk_size(100).progress(false);
    let data = input(10_000);
    let out = tracing::subscriber::with_default(subscriber, || {
        mapper.map(affine_chunk_failing(1000), &affine_args(), &data)
    })
    .unwrap();
    assert_eq!(out.len(), 9_000);

    let text = log.text();
    assert_eq!(text.matches("INFO parmap::diagnostics").count(), 10, "log:\n{text}");
    assert_eq!(text.matches("trace=").count(), 10, "every event carries its trace");
    assert!(!text.contains("WARN"), "no summary line at WARN: {text}");
    assert!(!text.contains("ERROR"), "log:\n{text}");
    assert!(text.contains("multiple of 1000"));
}

/// Errors without a recorded backtrace say so in their trace.
#[test]
fn error_traces_note_missing_backtrace() {
    let (mapper, sink) = quiet_mapper(2, 10);
    mapper.map(affine_chunk_failing(7), &affine_args(), &input(10)).unwrap();

    let failures = sink.entries();
    assert_eq!(failures.len(), 1);
    let trace = &failures[0].trace;
    assert!(trace.starts_with("chunk contains 0, a multiple of 7"), "trace: {trace}");
    assert!(
        trace.contains(BACKTRACE_NOT_CAPTURED) || trace.contains("Stack backtrace:"),
        "trace must either hold a backtrace or note its absence: {trace}"
    );
}
