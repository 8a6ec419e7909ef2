//! Lazy iteration over image files

use crate::Result;
use image::DynamicImage;
use mlutils_path::{resolve_many, PathInput};
use std::path::PathBuf;

/// Iterates over a list of image files, decoding one frame per step
///
/// Paths are validated for existence up front; decoding happens lazily,
/// so a corrupt file surfaces as an `Err` item at its position rather
/// than failing construction. Restart by constructing a new reader.
#[derive(Debug)]
pub struct ImageReader {
    paths: Vec<PathBuf>,
    next: usize,
    limit: Option<usize>,
}

impl ImageReader {
    /// Create a reader over one or many image paths
    ///
    /// # Errors
    /// Returns a path error if any of the files does not exist.
    pub fn new(paths: impl Into<PathInput>) -> Result<Self> {
        Ok(Self {
            paths: resolve_many(paths, true)?,
            next: 0,
            limit: None,
        })
    }

    /// Stop after at most `limit` frames
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Number of frames this reader will yield
    pub fn len(&self) -> usize {
        match self.limit {
            Some(limit) => self.paths.len().min(limit),
            None => self.paths.len(),
        }
    }

    /// Whether the reader will yield no frames
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The validated source paths, in iteration order
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Iterator for ImageReader {
    type Item = Result<DynamicImage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len() {
            return None;
        }
        let path = &self.paths[self.next];
        self.next += 1;
        Some(image::open(path).map_err(Into::into))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len() - self.next.min(self.len());
        (remaining, Some(remaining))
    }
}
