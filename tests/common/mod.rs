#![allow(dead_code)]

use anyhow::{bail, Result};
use parmap::{BoundedParallelMapper, CollectingSink, StaticArgs};
use std::sync::Arc;

/// Static arguments for the affine target used across tests: `i * scale + a + b`.
pub fn affine_args() -> StaticArgs {
    StaticArgs::new()
        .with("scale", 3u64)
        .unwrap()
        .with("a", 7u64)
        .unwrap()
        .with("b", 11u64)
        .unwrap()
}

pub fn affine(i: u64) -> u64 {
    i * 3 + 7 + 11
}

/// Per-item target reading its parameters from `StaticArgs`.
pub fn affine_item(i: &u64, args: &StaticArgs) -> Result<u64> {
    let scale: u64 = args.require("scale")?;
    let a: u64 = args.require("a")?;
    let b: u64 = args.require("b")?;
    Ok(i * scale + a + b)
}

/// Chunk target that fails for any chunk containing a multiple of `every`.
pub fn affine_chunk_failing(every: u64) -> impl Fn(&[u64], &StaticArgs) -> Result<Vec<u64>> + Sync {
    move |chunk: &[u64], args: &StaticArgs| -> Result<Vec<u64>> {
        if let Some(bad) = chunk.iter().find(|&&i| i % every == 0) {
            bail!("chunk contains {bad}, a multiple of {every}");
        }
        chunk.iter().map(|i| affine_item(i, args)).collect()
    }
}

pub fn input(n: u64) -> Vec<u64> {
    (0..n).collect()
}

/// Quiet mapper wired to a fresh collecting sink.
pub fn quiet_mapper(workers: usize, chunk_size: usize) -> (BoundedParallelMapper, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let mapper = BoundedParallelMapper::new()
        .workers(workers)
        .chunk_size(chunk_size)
        .progress(false)
        .sink(sink.clone());
    (mapper, sink)
}

pub fn sorted(mut v: Vec<u64>) -> Vec<u64> {
    v.sort_unstable();
    v
}
