//! Multivariate categorical sampling by inverse-CDF lookup.
//!
//! One uniform on (0, 1) is drawn per row, all rows first, then each row's
//! cumulative sum is searched for the first column whose cumulative
//! probability reaches the draw. Equal cumulative sums resolve to the lowest
//! column, so zero-probability categories are never selected.

use crate::errors::{Error, Sampled};
use crate::matrix::{check_label_count, resolve_categories, ProbabilityMatrix};
use rand::Rng;
use rand::distributions::Open01;
use rayon::prelude::*;
use tracing::debug;

pub fn cumulative_sum(v: &[f64]) -> Vec<f64> {
    let mut cs = Vec::with_capacity(v.len());
    let mut total = 0.0;
    for x in v {
        total += *x;
        cs.push(total);
    }
    cs
}

fn cumulative_sum_in_place(row: &mut [f64]) {
    let mut total = 0.0;
    for x in row.iter_mut() {
        total += *x;
        *x = total;
    }
}

/// Index of the first entry of the non-decreasing `cdf` that is `>= u`.
///
/// When rounding leaves the final cumulative sum just below `u`, falls back
/// to the last column with positive mass, i.e. the first one reaching the
/// total. An empty `cdf` yields 0.
pub(crate) fn search_cdf(cdf: &[f64], u: f64) -> usize {
    let j = cdf.partition_point(|c| *c < u);
    if j < cdf.len() {
        return j;
    }
    match cdf.last() {
        Some(total) => cdf.partition_point(|c| c < total),
        None => 0,
    }
}

/// Draws `n` selection uniforms on the open interval (0, 1).
pub fn draw_selection_uniforms<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.sample::<f64, _>(Open01)).collect()
}

/// A normalized matrix with its rows already turned into CDFs.
#[derive(Debug, Clone)]
pub struct CategoricalSampler {
    n_rows: usize,
    n_cols: usize,
    cdfs: Vec<f64>,
}

impl CategoricalSampler {
    /// Normalizes `matrix` and precomputes the per-row cumulative sums.
    pub fn new(matrix: ProbabilityMatrix) -> Result<Sampled<Self>, Error> {
        let normalized = matrix.normalize()?;
        Ok(normalized.map(|m| {
            let n_rows = m.n_rows();
            let n_cols = m.n_cols();
            let mut cdfs = m.as_flat().to_vec();
            cdfs.par_chunks_mut(n_cols).for_each(cumulative_sum_in_place);
            Self { n_rows, n_cols, cdfs }
        }))
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn cdf(&self, row: usize) -> &[f64] {
        &self.cdfs[row * self.n_cols..(row + 1) * self.n_cols]
    }

    /// Column indices chosen by the given per-row uniforms, one per row.
    pub fn select(&self, uniforms: &[f64]) -> Result<Vec<usize>, Error> {
        if uniforms.len() != self.n_rows {
            return Err(Error::DimensionMismatch { expected: self.n_rows, found: uniforms.len() });
        }
        Ok(self.lookup(uniforms))
    }

    fn lookup(&self, uniforms: &[f64]) -> Vec<usize> {
        self.cdfs
            .par_chunks(self.n_cols)
            .zip(uniforms.par_iter())
            .map(|(cdf, u)| search_cdf(cdf, *u))
            .collect()
    }

    /// One column index per row, consuming exactly `n_rows` draws.
    pub fn draw_indices<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        let uniforms = draw_selection_uniforms(rng, self.n_rows);
        debug!(n_rows = self.n_rows, n_cols = self.n_cols, "drew categorical indices");
        self.lookup(&uniforms)
    }

    /// One label per row. `labels` must have one entry per column.
    pub fn draw_labels<T, R>(&self, rng: &mut R, labels: &[T]) -> Result<Vec<T>, Error>
    where
        T: Clone,
        R: Rng + ?Sized,
    {
        check_label_count(labels.len(), self.n_cols)?;
        Ok(self.draw_indices(rng).into_iter().map(|j| labels[j].clone()).collect())
    }
}

/// Draws one numeric category per row without continuous-time correction.
pub fn sample_categories<R: Rng + ?Sized>(
    rng: &mut R,
    matrix: ProbabilityMatrix,
    categories: Option<&[f64]>,
) -> Result<Sampled<Vec<f64>>, Error> {
    let labels = resolve_categories(categories, matrix.n_cols())?;
    let sampler = CategoricalSampler::new(matrix)?;
    let diagnostics = sampler.diagnostics;
    let samples = sampler.value.draw_labels(rng, &labels)?;
    Ok(Sampled::new(samples, diagnostics))
}

/// Draws one arbitrary label per row, e.g. symbolic outcome names.
pub fn sample_labels<T, R>(
    rng: &mut R,
    matrix: ProbabilityMatrix,
    labels: &[T],
) -> Result<Sampled<Vec<T>>, Error>
where
    T: Clone,
    R: Rng + ?Sized,
{
    check_label_count(labels.len(), matrix.n_cols())?;
    let sampler = CategoricalSampler::new(matrix)?;
    let diagnostics = sampler.diagnostics;
    let samples = sampler.value.draw_labels(rng, labels)?;
    Ok(Sampled::new(samples, diagnostics))
}
