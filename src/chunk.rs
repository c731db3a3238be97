//! Partitioning of the input slice into dispatchable work items.

/// One contiguous chunk of the input, dispatched as a single task.
#[derive(Clone, Copy, Debug)]
pub struct WorkItem<'a, T> {
    /// Submission index of this chunk (0-based).
    pub index: usize,
    /// Position of `items[0]` in the original input.
    pub offset: usize,
    pub items: &'a [T],
}

/// Number of tasks a run over `len` elements dispatches: ceil(len / chunk_size).
/// Empty input dispatches nothing; a chunk size larger than the input yields one task.
pub fn task_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size.max(1))
}

/// Split `input` into contiguous chunks of `chunk_size` (the last may be shorter).
pub fn partition<T>(input: &[T], chunk_size: usize) -> Vec<WorkItem<'_, T>> {
    let size = chunk_size.max(1);
    input
        .chunks(size)
        .enumerate()
        .map(|(index, items)| WorkItem { index, offset: index * size, items })
        .collect()
}
