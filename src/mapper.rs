use crate::chunk::{partition, task_count};
use crate::concurrency::{dispatch, effective_workers};
use crate::config::{MapOptions, WorkerModel};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::outcome::TaskOutcome;
use crate::progress::ProgressCounter;
use crate::util::init_tracing_once;
use anyhow::Result;
use indicatif::ProgressBar;
use std::sync::Arc;

/// Applies a function to every element of a slice across a bounded worker pool,
/// with a progress bar and per-chunk failure isolation.
///
/// Failed chunks are reported to the diagnostic sink (INFO-level `tracing` events
/// by default) and contribute no values; the run always continues to the end.
/// Only a worker-pool startup failure is returned as `Err`.
#[derive(Clone)]
pub struct BoundedParallelMapper {
    pub(crate) opts: MapOptions,
    sink: Arc<dyn DiagnosticSink>,
    bar: Option<ProgressBar>,
}

impl Default for BoundedParallelMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundedParallelMapper {
    pub fn new() -> Self {
        Self::with_options(MapOptions::default())
    }

    pub fn with_options(opts: MapOptions) -> Self {
        Self { opts, sink: Arc::new(TracingSink), bar: None }
    }

    /// Defaults plus `PARMAP_*` environment overrides (see `MapOptions::from_env`).
    pub fn from_env() -> Result<Self> {
        Ok(Self::with_options(MapOptions::from_env()?))
    }

    // -------- Builder methods --------
    pub fn workers(mut self, n: usize) -> Self { self.opts = self.opts.with_workers(n); self }
    pub fn chunk_size(mut self, n: usize) -> Self { self.opts = self.opts.with_chunk_size(n); self }
    pub fn worker_model(mut self, model: WorkerModel) -> Self { self.opts = self.opts.with_worker_model(model); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    /// Drive this bar instead of creating one. Takes precedence over `progress(false)`.
    pub fn progress_bar(mut self, pb: ProgressBar) -> Self { self.bar = Some(pb); self }
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self { self.sink = sink; self }

    pub fn options(&self) -> &MapOptions {
        &self.opts
    }

    /// Worker count a run will actually use.
    pub fn effective_workers(&self) -> usize {
        effective_workers(self.opts.workers)
    }

    /// Number of tasks a run over `len` input elements dispatches.
    pub fn task_count(&self, len: usize) -> usize {
        task_count(len, self.opts.chunk_size)
    }

    // -------- Operations --------

    /// Apply `f` to each chunk and return the successful values in completion order.
    pub fn map<T, A, R, F>(&self, f: F, args: &A, input: &[T]) -> Result<Vec<R>>
    where
        T: Sync,
        A: Sync,
        R: Send,
        F: Fn(&[T], &A) -> Result<Vec<R>> + Sync,
    {
        let mut values = Vec::with_capacity(input.len());
        self.collect(&f, args, input, |outcome| {
            if let Ok(v) = outcome.result {
                values.extend(v);
            }
        })?;
        Ok(values)
    }

    /// Per-item form of `map`: `f` is applied to every element of each chunk, and the
    /// whole chunk fails if any element does.
    pub fn map_items<T, A, R, F>(&self, f: F, args: &A, input: &[T]) -> Result<Vec<R>>
    where
        T: Sync,
        A: Sync,
        R: Send,
        F: Fn(&T, &A) -> Result<R> + Sync,
    {
        self.map(|chunk: &[T], a: &A| chunk.iter().map(|item| f(item, a)).collect(), args, input)
    }

    /// Like `map`, but successful chunks are returned in submission (input) order.
    pub fn map_ordered<T, A, R, F>(&self, f: F, args: &A, input: &[T]) -> Result<Vec<R>>
    where
        T: Sync,
        A: Sync,
        R: Send,
        F: Fn(&[T], &A) -> Result<Vec<R>> + Sync,
    {
        let mut outcomes = self.map_outcomes(f, args, input)?;
        outcomes.sort_unstable_by_key(|o| o.chunk);
        Ok(outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .flatten()
            .collect())
    }

    /// Every task outcome, one per dispatched chunk, in completion order.
    /// Failures are still reported to the sink.
    pub fn map_outcomes<T, A, R, F>(&self, f: F, args: &A, input: &[T]) -> Result<Vec<TaskOutcome<R>>>
    where
        T: Sync,
        A: Sync,
        R: Send,
        F: Fn(&[T], &A) -> Result<Vec<R>> + Sync,
    {
        let mut outcomes = Vec::with_capacity(self.task_count(input.len()));
        self.collect(&f, args, input, |o| outcomes.push(o))?;
        Ok(outcomes)
    }

    /// Dispatch, drain completions, report failures, advance progress.
    fn collect<T, A, R, F, C>(&self, f: &F, args: &A, input: &[T], mut on_outcome: C) -> Result<()>
    where
        T: Sync,
        A: Sync,
        R: Send,
        F: Fn(&[T], &A) -> Result<Vec<R>> + Sync,
        C: FnMut(TaskOutcome<R>),
    {
        init_tracing_once();

        let work = partition(input, self.opts.chunk_size);
        let workers = self.effective_workers();
        if workers < self.opts.workers {
            tracing::debug!("Requested {} workers, clamped to {}.", self.opts.workers, workers);
        }
        tracing::debug!(
            "Dispatching {} tasks ({} items, chunk size {}) across {} workers ({:?}).",
            work.len(),
            input.len(),
            self.opts.chunk_size,
            workers,
            self.opts.worker_model
        );

        let total = work.len() as u64;
        let mut progress = match (&self.bar, self.opts.progress) {
            (Some(pb), _) => ProgressCounter::attached(total, pb.clone()),
            (None, true) => ProgressCounter::visible(total, self.opts.progress_label.as_deref().unwrap_or("")),
            (None, false) => ProgressCounter::silent(total),
        };

        let mut failed = 0usize;
        let sink = &self.sink;
        let res = dispatch(&work, args, f, workers, self.opts.worker_model, |outcome| {
            if let Err(failure) = &outcome.result {
                failed += 1;
                sink.record(failure);
            }
            progress.advance();
            on_outcome(outcome);
        });
        self.sink.flush();
        res?;

        debug_assert_eq!(progress.completed(), progress.total());
        if failed > 0 {
            tracing::debug!("{} of {} tasks failed; their items were dropped.", failed, work.len());
        }
        progress.finish(failed);
        Ok(())
    }
}
