use anyhow::{bail, Context, Result};
use parmap::{BoundedParallelMapper, StaticArgs};

const INPUT_LEN: u64 = 10_000;
const DEFAULT_CHUNK: usize = 10;

/// Static arguments of the demo target: `i * scale + offset_a + offset_b`.
struct Affine {
    scale: u64,
    offset_a: u64,
    offset_b: u64,
}

fn main() -> Result<()> {
    parmap::init_tracing_once();

    // Chunk size 10 unless PARMAP_CHUNK_SIZE says otherwise.
    let mut opts = parmap::MapOptions::default().with_chunk_size(DEFAULT_CHUNK).merge_env()?;
    if opts.progress_label.is_none() {
        opts = opts.with_progress_label("Mapping");
    }
    let mapper = BoundedParallelMapper::with_options(opts);

    let args = match std::env::var("PARMAP_ARGS") {
        Ok(json) if !json.trim().is_empty() => StaticArgs::from_json(&json)?,
        _ => StaticArgs::new().with("scale", 3u64)?.with("offset_a", 7u64)?.with("offset_b", 11u64)?,
    };
    let affine = Affine {
        scale: args.require("scale")?,
        offset_a: args.require("offset_a")?,
        offset_b: args.require("offset_b")?,
    };

    // Induce failures for every chunk holding a multiple of N (0 disables).
    let fail_every: u64 = match std::env::var("PARMAP_FAIL_EVERY") {
        Ok(v) if !v.trim().is_empty() => v.trim().parse().with_context(|| format!("PARMAP_FAIL_EVERY={v}"))?,
        _ => 0,
    };

    let input: Vec<u64> = (0..INPUT_LEN).collect();
    let results = mapper.map(
        |chunk: &[u64], a: &Affine| -> Result<Vec<u64>> {
            if fail_every > 0 {
                if let Some(bad) = chunk.iter().find(|&&i| i % fail_every == 0) {
                    bail!("refusing chunk containing {bad} (multiple of {fail_every})");
                }
            }
            Ok(chunk.iter().map(|&i| i * a.scale + a.offset_a + a.offset_b).collect())
        },
        &affine,
        &input,
    )?;

    println!(
        "Mapped {} of {} items across {} workers (chunk size {}).",
        results.len(),
        input.len(),
        mapper.effective_workers(),
        mapper.options().chunk_size
    );
    Ok(())
}
