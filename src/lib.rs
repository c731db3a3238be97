mod config;
mod args;
mod chunk;
mod outcome;
mod capture;

mod progress;
mod diagnostics;
mod concurrency;
mod util;
mod mapper;

pub use crate::config::{MapOptions, WorkerModel};
pub use crate::args::StaticArgs;
pub use crate::chunk::{partition, task_count, WorkItem};
pub use crate::outcome::{FailureKind, TaskFailure, TaskOutcome, BACKTRACE_NOT_CAPTURED};
pub use crate::mapper::BoundedParallelMapper;

// Expose multiprogress and progress helpers.
pub use crate::progress::{set_global_multiprogress, make_count_progress, ProgressCounter};

// Diagnostic sinks for captured task failures.
pub use crate::diagnostics::{CollectingSink, DiagnosticSink, Tee, TracingSink};

pub use crate::concurrency::{available_workers, effective_workers};
pub use crate::util::init_tracing_once;
