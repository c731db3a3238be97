//! Diagnostic sinks receiving one entry per failed task.

use crate::outcome::TaskFailure;
use parking_lot::Mutex;

/// Destination for captured task failures. Created before a run, called from the
/// collecting thread once per failure, and flushed when the run ends.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, failure: &TaskFailure);

    fn flush(&self) {}
}

/// Default sink: one INFO-level `tracing` event per failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, failure: &TaskFailure) {
        tracing::info!(
            chunk = failure.chunk,
            offset = failure.offset,
            len = failure.len,
            kind = ?failure.kind,
            trace = %failure.trace,
            "{}",
            failure
        );
    }
}

/// Keeps every failure in memory; useful for callers that want to inspect or
/// report failures after a run.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<TaskFailure>>,
    flushes: Mutex<usize>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn entries(&self) -> Vec<TaskFailure> {
        self.entries.lock().clone()
    }

    /// Drain collected entries, leaving the sink empty.
    pub fn take(&self) -> Vec<TaskFailure> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Number of completed runs that flushed into this sink.
    pub fn flush_count(&self) -> usize {
        *self.flushes.lock()
    }
}

impl DiagnosticSink for CollectingSink {
    fn record(&self, failure: &TaskFailure) {
        self.entries.lock().push(failure.clone());
    }

    fn flush(&self) {
        *self.flushes.lock() += 1;
    }
}

/// Fan a failure out to several sinks (e.g. tracing + collection).
pub struct Tee(pub Vec<std::sync::Arc<dyn DiagnosticSink>>);

impl DiagnosticSink for Tee {
    fn record(&self, failure: &TaskFailure) {
        for s in &self.0 {
            s.record(failure);
        }
    }

    fn flush(&self) {
        for s in &self.0 {
            s.flush();
        }
    }
}
