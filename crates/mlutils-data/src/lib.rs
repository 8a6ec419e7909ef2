//! Data-shaping utilities for ML pipelines
//!
//! - Fixed-size batch chunking
//! - Compressed sparse row (CSR) encoding of index lists

#![warn(missing_docs)]

pub mod batch;
pub mod sparse;

pub use batch::{batches, chunk_to_batches};
pub use sparse::CsrMatrix;

/// Result type for data-shaping operations
pub type Result<T> = std::result::Result<T, Error>;

/// Data-shaping errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Batch size of zero can never cover the input
    #[error("batch size must be greater than zero")]
    InvalidBatchSize,
}
