//! Row-stochastic probability matrices and their validation.
//!
//! A `ProbabilityMatrix` stores R rows of K category probabilities in a
//! single row-major buffer. Rows that do not sum to one within
//! `ROW_SUM_TOLERANCE` are divided by their own sum; every such row is
//! reported as a `Diagnostic` rather than an error.

use crate::errors::{Diagnostic, Error, Sampled};
use rayon::prelude::*;
use tracing::{debug, warn};

pub const ROW_SUM_TOLERANCE: f64 = 1.5e-8;

#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMatrix {
    n_rows: usize,
    n_cols: usize,
    values: Vec<f64>,
}

impl ProbabilityMatrix {
    /// Builds a matrix from row-major values. Entries are checked by
    /// `normalize`, not here.
    pub fn from_flat(n_rows: usize, n_cols: usize, values: Vec<f64>) -> Result<Self, Error> {
        if n_cols == 0 || n_rows == 0 {
            return Err(Error::InvalidInputKind {
                row: 0, column: 0,
                reason: format!("matrix must be non-empty, got {} x {}", n_rows, n_cols),
            });
        }
        if values.len() != n_rows * n_cols {
            return Err(Error::InvalidInputKind {
                row: values.len() / n_cols, column: values.len() % n_cols,
                reason: format!("expected {} values, found {}", n_rows * n_cols, values.len()),
            });
        }
        Ok(Self { n_rows, n_cols, values })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, Error> {
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut values = Vec::with_capacity(rows.len() * n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(Error::InvalidInputKind {
                    row: i, column: row.len().min(n_cols),
                    reason: format!("row has {} entries, expected {}", row.len(), n_cols),
                });
            }
            values.extend_from_slice(row);
        }
        Self::from_flat(rows.len(), n_cols, values)
    }

    /// A matrix whose `n_rows` rows all equal `probs`.
    pub fn repeated(probs: &[f64], n_rows: usize) -> Result<Self, Error> {
        let mut values = Vec::with_capacity(probs.len() * n_rows);
        for _ in 0..n_rows {
            values.extend_from_slice(probs);
        }
        Self::from_flat(n_rows, probs.len(), values)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n_cols..(i + 1) * self.n_cols]
    }

    pub fn rows(&self) -> std::slice::Chunks<'_, f64> {
        self.values.chunks(self.n_cols)
    }

    pub fn as_flat(&self) -> &[f64] {
        &self.values
    }

    pub fn row_sums(&self) -> Vec<f64> {
        self.rows().map(|r| r.iter().sum()).collect()
    }

    /// Checks every entry, then divides each row whose sum is further than
    /// `ROW_SUM_TOLERANCE` from 1 by that sum. Only the offending rows change.
    pub fn normalize(mut self) -> Result<Sampled<Self>, Error> {
        self.validate_entries()?;

        let n_cols = self.n_cols;
        let diagnostics: Vec<Diagnostic> = self.values
            .par_chunks_mut(n_cols)
            .enumerate()
            .filter_map(|(i, row)| {
                let sum: f64 = row.iter().sum();
                if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                    for p in row.iter_mut() {
                        *p /= sum;
                    }
                    Some(Diagnostic::RowNormalizationApplied { row: i, original_sum: sum })
                }
                else {
                    None
                }
            })
            .collect();

        if !diagnostics.is_empty() {
            let rows: Vec<usize> = diagnostics.iter().map(|d| d.row()).collect();
            warn!(n_rows = rows.len(), ?rows, "probability rows did not sum to 1; normalized");
        }
        debug!(n_rows = self.n_rows, n_cols = self.n_cols, "validated probability matrix");

        Ok(Sampled::new(self, diagnostics))
    }

    fn validate_entries(&self) -> Result<(), Error> {
        for (i, row) in self.rows().enumerate() {
            for (j, &p) in row.iter().enumerate() {
                if !p.is_finite() {
                    return Err(Error::InvalidInputKind {
                        row: i, column: j,
                        reason: format!("probability {} is not a finite number", p),
                    });
                }
                if p < 0.0 {
                    return Err(Error::InvalidInputKind {
                        row: i, column: j,
                        reason: format!("probability {} is negative", p),
                    });
                }
            }
            let sum: f64 = row.iter().sum();
            if sum <= 0.0 {
                return Err(Error::InvalidInputKind {
                    row: i, column: 0,
                    reason: "row sums to zero and cannot be normalized".into(),
                });
            }
            if !sum.is_finite() {
                return Err(Error::InvalidInputKind {
                    row: i, column: 0,
                    reason: format!("row sum {} overflows and cannot be normalized", sum),
                });
            }
        }
        Ok(())
    }
}

/// Resolves optional labels against the column count, defaulting to 0..K-1.
pub fn resolve_categories(categories: Option<&[f64]>, n_cols: usize) -> Result<Vec<f64>, Error> {
    match categories {
        Some(categories) => {
            check_label_count(categories.len(), n_cols)?;
            Ok(categories.to_vec())
        },
        None => Ok((0..n_cols).map(|j| j as f64).collect()),
    }
}

pub fn check_label_count(n_labels: usize, n_cols: usize) -> Result<(), Error> {
    if n_labels != n_cols {
        Err(Error::DimensionMismatch { expected: n_cols, found: n_labels })
    }
    else {
        Ok(())
    }
}
