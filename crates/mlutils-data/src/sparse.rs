//! Compressed sparse row encoding of index lists
//!
//! Encodes a batch of index lists (for example token-id or category-id
//! rows) as a binary CSR matrix: row *i*'s nonzero columns are exactly the
//! integers in input row *i*, each contributing a count of 1. Duplicate
//! indices within a row accumulate, matching standard CSR summation.

use serde::{Deserialize, Serialize};

/// A CSR matrix of unsigned counts
///
/// Within each row the column indices are stored sorted ascending; the
/// usual CSR invariants hold: `indptr.len() == rows + 1`,
/// `indptr[rows] == indices.len() == values.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrMatrix {
    indptr: Vec<usize>,
    indices: Vec<u32>,
    values: Vec<u32>,
    cols: u32,
}

impl Default for CsrMatrix {
    /// The empty 0x0 matrix; `indptr` keeps its leading 0 so the row
    /// invariants hold even with no rows.
    fn default() -> Self {
        Self::from_index_rows(&[])
    }
}

impl CsrMatrix {
    /// Encode one index list per row, accumulating duplicates
    pub fn from_index_rows(rows: &[Vec<u32>]) -> Self {
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut values = Vec::new();
        let mut cols = 0u32;
        indptr.push(0);

        for row in rows {
            let mut sorted = row.clone();
            sorted.sort_unstable();
            let row_start = indices.len();
            for index in sorted {
                cols = cols.max(index.saturating_add(1));
                // Runs of equal indices within the row collapse into one
                // entry with an accumulated count.
                if indices.len() > row_start && *indices.last().unwrap() == index {
                    *values.last_mut().unwrap() += 1;
                } else {
                    indices.push(index);
                    values.push(1);
                }
            }
            indptr.push(indices.len());
        }

        Self { indptr, indices, values, cols }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.indptr.len() - 1
    }

    /// Number of columns: one past the largest index seen (saturating at
    /// `u32::MAX`), 0 if none
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Number of stored (nonzero) entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Column indices and counts of row `i`
    ///
    /// # Panics
    /// Panics if `i >= self.rows()`.
    pub fn row(&self, i: usize) -> (&[u32], &[u32]) {
        let (lo, hi) = (self.indptr[i], self.indptr[i + 1]);
        (&self.indices[lo..hi], &self.values[lo..hi])
    }

    /// Row offsets (`rows + 1` entries)
    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    /// Materialize as a dense row-major matrix of counts
    pub fn to_dense(&self) -> Vec<Vec<u32>> {
        let mut dense = vec![vec![0; self.cols as usize]; self.rows()];
        for i in 0..self.rows() {
            let (cols, vals) = self.row(i);
            for (&c, &v) in cols.iter().zip(vals) {
                dense[i][c as usize] = v;
            }
        }
        dense
    }
}
