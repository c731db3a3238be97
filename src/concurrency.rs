//! Concurrency helpers: clamp the worker count, run chunks on the selected worker
//! model, and hand every outcome back to the calling thread in completion order.

use crate::chunk::WorkItem;
use crate::config::WorkerModel;
use crate::outcome::{run_chunk, TaskOutcome};
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;

/// Execution units the host makes available to this process.
pub fn available_workers() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Requested pool size clamped to `[1, available_workers()]`.
pub fn effective_workers(requested: usize) -> usize {
    requested.clamp(1, available_workers())
}

/// Run `f` over every work item with at most `workers` in flight.
/// `on_outcome` is called on the current thread, once per item, as tasks complete.
/// Only worker-pool startup errors are returned; task failures travel inside the outcomes.
pub(crate) fn dispatch<T, A, R, F, C>(
    work: &[WorkItem<'_, T>],
    args: &A,
    f: &F,
    workers: usize,
    model: WorkerModel,
    on_outcome: C,
) -> Result<()>
where
    T: Sync,
    A: Sync,
    R: Send,
    F: Fn(&[T], &A) -> Result<Vec<R>> + Sync,
    C: FnMut(TaskOutcome<R>),
{
    if work.is_empty() {
        return Ok(());
    }
    let workers = workers.min(work.len()).max(1);
    match model {
        WorkerModel::Pool if workers > 1 => run_pool(work, args, f, workers, on_outcome),
        WorkerModel::Threads if workers > 1 => run_threads(work, args, f, workers, on_outcome),
        _ => {
            run_inline(work, args, f, on_outcome);
            Ok(())
        }
    }
}

fn run_inline<T, A, R, F, C>(work: &[WorkItem<'_, T>], args: &A, f: &F, mut on_outcome: C)
where
    F: Fn(&[T], &A) -> Result<Vec<R>>,
    C: FnMut(TaskOutcome<R>),
{
    for w in work {
        on_outcome(run_chunk(w, args, f));
    }
}

fn run_pool<T, A, R, F, C>(
    work: &[WorkItem<'_, T>],
    args: &A,
    f: &F,
    workers: usize,
    mut on_outcome: C,
) -> Result<()>
where
    T: Sync,
    A: Sync,
    R: Send,
    F: Fn(&[T], &A) -> Result<Vec<R>> + Sync,
    C: FnMut(TaskOutcome<R>),
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("parmap-pool-{i}"))
        .build()
        .context("start rayon worker pool")?;

    let (tx, rx) = mpsc::channel::<TaskOutcome<R>>();
    std::thread::scope(|s| {
        // Submission happens off the collecting thread so draining starts immediately.
        s.spawn(move || {
            pool.scope(move |scope| {
                for w in work {
                    let tx = tx.clone();
                    scope.spawn(move |_| {
                        let _ = tx.send(run_chunk(w, args, f));
                    });
                }
            });
        });
        for outcome in rx {
            on_outcome(outcome);
        }
    });
    Ok(())
}

fn run_threads<T, A, R, F, C>(
    work: &[WorkItem<'_, T>],
    args: &A,
    f: &F,
    workers: usize,
    mut on_outcome: C,
) -> Result<()>
where
    T: Sync,
    A: Sync,
    R: Send,
    F: Fn(&[T], &A) -> Result<Vec<R>> + Sync,
    C: FnMut(TaskOutcome<R>),
{
    let cursor = AtomicUsize::new(0);
    let stop = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<TaskOutcome<R>>();

    std::thread::scope(|s| -> Result<()> {
        let mut spawn_err = None;
        for i in 0..workers {
            let tx = tx.clone();
            let cursor = &cursor;
            let stop = &stop;
            let spawned = std::thread::Builder::new()
                .name(format!("parmap-worker-{i}"))
                .spawn_scoped(s, move || {
                    while !stop.load(Ordering::Relaxed) {
                        let Some(w) = work.get(cursor.fetch_add(1, Ordering::Relaxed)) else {
                            break;
                        };
                        if tx.send(run_chunk(w, args, f)).is_err() {
                            break;
                        }
                    }
                });
            if let Err(e) = spawned {
                spawn_err = Some((i, e));
                break;
            }
        }
        drop(tx);

        if let Some((i, e)) = spawn_err {
            // Workers already running finish their current chunk and exit.
            stop.store(true, Ordering::Relaxed);
            return Err(e).with_context(|| format!("spawn worker thread {i} of {workers}"));
        }
        for outcome in rx {
            on_outcome(outcome);
        }
        Ok(())
    })
}
