//! Conversions from hazard and cumulative curves to probability mass
//! functions over unit time buckets.
//!
//! With per-unit hazard rates `h(t)`, the cumulative hazard is
//! `H(t) = h(0) + ... + h(t)`, survival `S(t) = exp(-H(t))`, cumulative
//! probability `F(t) = 1 - S(t)` and instantaneous probability
//! `f(t) = F(t) - F(t-1)` with `f(0) = F(0)`.

use crate::errors::Error;
use crate::sampler::cumulative_sum;

/// PMF over `rates.len() + 1` buckets. The extra terminal bucket holds the
/// probability of surviving past the last rate, `S(last)`, so the result
/// sums to 1.
pub fn pmf_from_hazard_rates(rates: &[f64]) -> Result<Vec<f64>, Error> {
    for (t, rate) in rates.iter().enumerate() {
        if !rate.is_finite() || *rate < 0.0 {
            return Err(Error::InvalidInputKind {
                row: 0, column: t,
                reason: format!("hazard rate {} must be finite and non-negative", rate),
            });
        }
    }
    let cdf: Vec<f64> = cumulative_sum(rates).iter().map(|h| 1.0 - (-h).exp()).collect();
    let mut pmf = pmf_from_cdf(&cdf)?;
    pmf.push(1.0 - cdf.last().copied().unwrap_or(0.0));
    Ok(pmf)
}

/// First difference of a CDF row, keeping `F(0)` as the first mass.
pub fn pmf_from_cdf(cdf: &[f64]) -> Result<Vec<f64>, Error> {
    let mut previous = 0.0;
    let mut pmf = Vec::with_capacity(cdf.len());
    for (t, f) in cdf.iter().enumerate() {
        if !f.is_finite() || *f < previous || *f > 1.0 {
            return Err(Error::InvalidInputKind {
                row: 0, column: t,
                reason: format!("cumulative probability {} must be non-decreasing within [0, 1]", f),
            });
        }
        pmf.push(f - previous);
        previous = *f;
    }
    Ok(pmf)
}

/// Discrete expectation `sum_t S(t)` for a PMF over buckets `0, 1, ...`.
pub fn survival_expectation(pmf: &[f64]) -> f64 {
    cumulative_sum(pmf).iter().map(|f| 1.0 - f).sum()
}

/// Mean and variance of `category + U[0, 1)` when the category follows `pmf`.
pub fn corrected_moments(categories: &[f64], pmf: &[f64]) -> (f64, f64) {
    let total: f64 = pmf.iter().sum();
    let mut first = 0.0;
    let mut second = 0.0;
    for (c, p) in categories.iter().zip(pmf) {
        let p = p / total;
        first += p * (c + 0.5);
        second += p * (c * c + c + 1.0 / 3.0);
    }
    (first, second - first * first)
}
