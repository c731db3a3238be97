use anyhow::{anyhow, Context, Result};
use std::str::FromStr;

/// Execution context used to run dispatched chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerModel {
    /// Dedicated rayon thread pool, one spawned task per chunk.
    Pool,
    /// Named OS threads pulling chunk indices from a shared cursor.
    Threads,
    /// Run every chunk on the calling thread.
    Inline,
}

impl FromStr for WorkerModel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pool" | "rayon" => Ok(WorkerModel::Pool),
            "threads" | "thread" => Ok(WorkerModel::Threads),
            "inline" | "sequential" => Ok(WorkerModel::Inline),
            other => Err(anyhow!("unknown worker model: {other:?}")),
        }
    }
}

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct MapOptions {
    pub workers: usize,               // requested; clamped to available parallelism at run time
    pub chunk_size: usize,            // input elements per dispatched task
    pub worker_model: WorkerModel,
    pub progress: bool,               // show progress bar
    pub progress_label: Option<String>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            workers: 8,
            chunk_size: 1,
            worker_model: WorkerModel::Pool,
            progress: true,
            progress_label: None,
        }
    }
}

impl MapOptions {
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n.max(1);
        self
    }
    pub fn with_chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = n.max(1);
        self
    }
    pub fn with_worker_model(mut self, model: WorkerModel) -> Self {
        self.worker_model = model;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }

    /// Defaults overridden by environment variables:
    /// - PARMAP_WORKERS: requested worker count
    /// - PARMAP_CHUNK_SIZE: elements per task
    /// - PARMAP_PROGRESS: 0/1/true/false
    /// - PARMAP_WORKER_MODEL: pool | threads | inline
    /// - PARMAP_PROGRESS_LABEL: bar label
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Apply `PARMAP_*` overrides on top of the current values.
    /// Unset or blank variables leave the field untouched; malformed values are errors.
    pub fn merge_env(mut self) -> Result<Self> {
        if let Some(v) = env_nonblank("PARMAP_WORKERS") {
            let n: usize = v.parse().with_context(|| format!("PARMAP_WORKERS={v}"))?;
            self = self.with_workers(n);
        }
        if let Some(v) = env_nonblank("PARMAP_CHUNK_SIZE") {
            let n: usize = v.parse().with_context(|| format!("PARMAP_CHUNK_SIZE={v}"))?;
            self = self.with_chunk_size(n);
        }
        if let Some(v) = env_nonblank("PARMAP_PROGRESS") {
            let yes = parse_flag(&v).with_context(|| format!("PARMAP_PROGRESS={v}"))?;
            self = self.with_progress(yes);
        }
        if let Some(v) = env_nonblank("PARMAP_WORKER_MODEL") {
            let m: WorkerModel = v.parse().context("PARMAP_WORKER_MODEL")?;
            self = self.with_worker_model(m);
        }
        if let Some(v) = env_nonblank("PARMAP_PROGRESS_LABEL") {
            self = self.with_progress_label(v);
        }
        Ok(self)
    }
}

fn env_nonblank(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty()).map(|s| s.trim().to_string())
}

fn parse_flag(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("expected a boolean flag, got {other:?}")),
    }
}
