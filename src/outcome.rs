//! Per-task outcomes: the values a chunk produced, or a captured failure.

use crate::capture::{try_call, CaughtPanic};
use crate::chunk::WorkItem;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::backtrace::BacktraceStatus;
use std::fmt;

/// Appended to error traces when the error carries no backtrace of its own.
pub const BACKTRACE_NOT_CAPTURED: &str =
    "backtrace not captured (set RUST_BACKTRACE=1 or RUST_LIB_BACKTRACE=1 to record one)";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The target function returned `Err`.
    Error,
    /// The target function panicked.
    Panic,
}

/// Diagnostic for a chunk whose target invocation failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub chunk: usize,
    pub offset: usize,
    pub len: usize,
    pub kind: FailureKind,
    /// One-line description (the error's display chain, or the panic message).
    pub message: String,
    /// Full trace: cause chain plus backtrace when one was captured.
    pub trace: String,
}

impl TaskFailure {
    fn from_error<T>(work: &WorkItem<'_, T>, err: anyhow::Error) -> Self {
        Self {
            chunk: work.index,
            offset: work.offset,
            len: work.items.len(),
            kind: FailureKind::Error,
            message: format!("{err:#}"),
            trace: error_trace(&err),
        }
    }

    fn from_panic<T>(work: &WorkItem<'_, T>, panic: CaughtPanic) -> Self {
        let message = panic.message();
        Self {
            chunk: work.index,
            offset: work.offset,
            len: work.items.len(),
            kind: FailureKind::Panic,
            trace: format!("panicked: {message}\n{}", panic.trace),
            message,
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FailureKind::Error => "failed",
            FailureKind::Panic => "panicked",
        };
        write!(
            f,
            "chunk {} (items {}..{}) {}: {}",
            self.chunk,
            self.offset,
            self.offset + self.len,
            kind,
            self.message
        )
    }
}

/// Exactly one of these is produced for every dispatched chunk.
#[derive(Debug)]
pub struct TaskOutcome<R> {
    pub chunk: usize,
    pub offset: usize,
    pub len: usize,
    pub result: std::result::Result<Vec<R>, TaskFailure>,
}

impl<R> TaskOutcome<R> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        self.result.as_ref().err()
    }
}

/// Invoke `f` on one work item, turning both `Err` and panics into a `TaskFailure`.
pub(crate) fn run_chunk<T, A, R, F>(work: &WorkItem<'_, T>, args: &A, f: &F) -> TaskOutcome<R>
where
    F: Fn(&[T], &A) -> Result<Vec<R>>,
{
    let result = match try_call(|| f(work.items, args)) {
        Ok(Ok(values)) => Ok(values),
        Ok(Err(err)) => Err(TaskFailure::from_error(work, err)),
        Err(panic) => Err(TaskFailure::from_panic(work, panic)),
    };
    TaskOutcome { chunk: work.index, offset: work.offset, len: work.items.len(), result }
}

/// Cause chain, followed by anyhow's backtrace when one was recorded.
fn error_trace(err: &anyhow::Error) -> String {
    let chain = format!("{err:?}");
    match err.backtrace().status() {
        BacktraceStatus::Captured => chain,
        _ => format!("{chain}\n\n{BACKTRACE_NOT_CAPTURED}"),
    }
}
