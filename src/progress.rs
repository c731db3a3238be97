//! Progress reporting: count-style bar over completed tasks, optional global MultiProgress.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Optional global MultiProgress that allows multiple bars to render concurrently.
/// If unset, progress bars draw to the default terminal target.
static GLOBAL_MP: OnceLock<Arc<MultiProgress>> = OnceLock::new();

const COUNT_TEMPLATE: &str = "{spinner:.green} {msg} {pos}/{len} [{bar:.cyan/blue}] {percent:>3}%  \
     it/s: {per_sec}  elapsed: {elapsed_precise}  eta: {eta_precise}";

/// Install a global MultiProgress used by all subsequently created progress bars.
/// Safe to call once; additional calls are ignored.
pub fn set_global_multiprogress(mp: Arc<MultiProgress>) {
    let _ = GLOBAL_MP.set(mp);
}

fn new_bar(total: u64) -> ProgressBar {
    if let Some(mp) = GLOBAL_MP.get() {
        mp.add(ProgressBar::new(total))
    } else {
        ProgressBar::new(total)
    }
}

fn count_style() -> ProgressStyle {
    ProgressStyle::with_template(COUNT_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
}

/// Count-style progress bar (tasks completed out of total), with an optional label.
pub fn make_count_progress(total: u64, label: &str) -> ProgressBar {
    let pb = new_bar(total);
    pb.set_style(count_style());
    if !label.is_empty() {
        pb.set_message(label.to_string());
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Completed-task counter for one run. Owned by the collecting thread only;
/// workers never touch it.
pub struct ProgressCounter {
    completed: u64,
    total: u64,
    pb: Option<ProgressBar>,
}

impl ProgressCounter {
    /// Counter without any display.
    pub fn silent(total: u64) -> Self {
        Self { completed: 0, total, pb: None }
    }

    /// Counter rendered through a fresh count bar.
    pub fn visible(total: u64, label: &str) -> Self {
        Self { completed: 0, total, pb: Some(make_count_progress(total, label)) }
    }

    /// Counter that drives a caller-supplied bar (e.g. one owned by a MultiProgress).
    /// The bar's length is reset to `total` and its position to 0.
    pub fn attached(total: u64, pb: ProgressBar) -> Self {
        pb.set_length(total);
        pb.set_position(0);
        Self { completed: 0, total, pb: Some(pb) }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.completed += 1;
        if let Some(pb) = &self.pb {
            pb.inc(1);
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn finish(self, failed: usize) {
        if let Some(pb) = self.pb {
            if failed == 0 {
                pb.finish_with_message(format!("done ({} tasks)", self.completed));
            } else {
                pb.finish_with_message(format!("done ({} tasks, {} failed)", self.completed, failed));
            }
        }
    }
}
