//! Contiguous fixed-size partitioning of keys and table rows.
//!
//! One routine serves both directions: registration codes are cut into
//! batches of 40 for multi-key queries, NAV rows into batches of 1000 for
//! uploads. Concatenating the batches in order always gives back the input.

use crate::error::NavError;
use std::ops::Range;

/// One contiguous slice of the input plus its position among the batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBatch<'a, T> {
    pub index: usize,
    pub items: &'a [T],
}

impl<T> KeyBatch<'_, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Row ranges `[0, c), [c, 2c), ...` covering `0..len`.
pub fn chunk_bounds(len: usize, max_chunk: usize) -> Result<Vec<Range<usize>>, NavError> {
    if max_chunk == 0 {
        return Err(NavError::Validation("chunk size must be at least 1".into()));
    }
    Ok((0..len)
        .step_by(max_chunk)
        .map(|start| start..(start + max_chunk).min(len))
        .collect())
}

/// Split a slice into batches of at most `max_chunk` elements.
pub fn partition<T>(items: &[T], max_chunk: usize) -> Result<Vec<KeyBatch<'_, T>>, NavError> {
    Ok(chunk_bounds(items.len(), max_chunk)?
        .into_iter()
        .enumerate()
        .map(|(index, range)| KeyBatch {
            index,
            items: &items[range],
        })
        .collect())
}
