// src/utils/chunked.rs
//! Splitting work so each statement stays under the store's bind-parameter
//! ceiling, then folding the per-chunk results back together.

use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("chunk limit must be greater than 0")]
    ZeroLimit,

    #[error("a single item weighs {weight}, more than the chunk limit of {limit}")]
    ItemTooLarge { weight: usize, limit: usize },
}

/// Cuts `items` into consecutive slices whose summed weight is at most `limit`.
/// Order is preserved; zero-weight items ride along with their neighbours.
pub fn partition_by_weight<T>(
    items: &[T],
    limit: usize,
    weight: impl Fn(&T) -> usize,
) -> Result<Vec<&[T]>, ChunkError> {
    if limit == 0 {
        return Err(ChunkError::ZeroLimit);
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut current = 0;

    for (i, item) in items.iter().enumerate() {
        let w = weight(item);
        if w > limit {
            return Err(ChunkError::ItemTooLarge { weight: w, limit });
        }
        if current + w > limit {
            chunks.push(&items[start..i]);
            start = i;
            current = 0;
        }
        current += w;
    }
    if start < items.len() {
        chunks.push(&items[start..]);
    }
    Ok(chunks)
}

/// Runs `exec` on each weight-bounded chunk in order and folds the outputs
/// with `combine`. The first error aborts the remaining chunks.
pub async fn run_weighted<'a, T, O, R, E, F, Fut>(
    items: &'a [T],
    limit: usize,
    weight: impl Fn(&T) -> usize,
    init: R,
    mut exec: F,
    mut combine: impl FnMut(R, O) -> R,
) -> Result<R, E>
where
    F: FnMut(usize, &'a [T]) -> Fut,
    Fut: Future<Output = Result<O, E>>,
    E: From<ChunkError>,
{
    let chunks = partition_by_weight(items, limit, weight)?;
    let mut acc = init;
    for (n, chunk) in chunks.into_iter().enumerate() {
        let output = exec(n, chunk).await?;
        acc = combine(acc, output);
    }
    Ok(acc)
}

/// Fixed-size variant of [`run_weighted`], for statements where every item
/// costs the same number of parameters (bulk inserts).
pub async fn run_batches<'a, T, O, R, E, F, Fut>(
    items: &'a [T],
    batch_size: usize,
    init: R,
    exec: F,
    combine: impl FnMut(R, O) -> R,
) -> Result<R, E>
where
    F: FnMut(usize, &'a [T]) -> Fut,
    Fut: Future<Output = Result<O, E>>,
    E: From<ChunkError>,
{
    run_weighted(items, batch_size, |_| 1, init, exec, combine).await
}
