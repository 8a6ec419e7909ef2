//! Fixed-size batch chunking
//!
//! Splits a sequence into contiguous batches of at most `batch_size`
//! elements, covering the input exactly once in order. The last batch may
//! be shorter.

use crate::{Error, Result};

/// Split a slice into borrowed batches of at most `batch_size` elements
///
/// # Errors
/// Returns [`Error::InvalidBatchSize`] if `batch_size` is zero.
pub fn batches<T>(items: &[T], batch_size: usize) -> Result<impl Iterator<Item = &[T]>> {
    if batch_size == 0 {
        return Err(Error::InvalidBatchSize);
    }
    Ok(items.chunks(batch_size))
}

/// Split a slice into owned batches of at most `batch_size` elements
///
/// # Errors
/// Returns [`Error::InvalidBatchSize`] if `batch_size` is zero.
pub fn chunk_to_batches<T: Clone>(items: &[T], batch_size: usize) -> Result<Vec<Vec<T>>> {
    Ok(batches(items, batch_size)?.map(<[T]>::to_vec).collect())
}
