//! Descriptive summaries of a sample vector.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    pub sd: f64,
    pub min: f64,
    pub max: f64,
    pub q025: f64,
    pub q975: f64,
}

impl SampleSummary {
    /// `None` for an empty sample or one containing NaN.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() || samples.iter().any(|x| x.is_nan()) {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let sd = if n > 1 {
            (sorted.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1) as f64).sqrt()
        }
        else {
            0.0
        };

        Some(Self {
            n,
            mean,
            median: quantile_sorted(&sorted, 0.5),
            sd,
            min: sorted[0],
            max: sorted[n - 1],
            q025: quantile_sorted(&sorted, 0.025),
            q975: quantile_sorted(&sorted, 0.975),
        })
    }
}

/// Linear interpolation between order statistics (R type 7).
/// `sorted` must be non-empty and sorted ascending.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
    let j = h.floor() as usize;
    let g = h - h.floor();
    if j + 1 >= n {
        sorted[n - 1]
    }
    else {
        (1.0 - g) * sorted[j] + g * sorted[j + 1]
    }
}

/// Relative frequency of each category, in category order. Samples that
/// match no category are not counted.
pub fn category_frequencies(samples: &[f64], categories: &[f64]) -> IndexMap<String, f64> {
    let mut counts: IndexMap<String, usize> =
        categories.iter().map(|c| (c.to_string(), 0)).collect();
    for x in samples {
        if let Some(count) = counts.get_mut(&x.to_string()) {
            *count += 1;
        }
    }
    let n = samples.len().max(1) as f64;
    counts.into_iter().map(|(c, count)| (c, count as f64 / n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let s = SampleSummary::from_samples(&[3.0, 1.0, 4.0, 2.0, 5.0]).unwrap();
        assert_eq!(s.n, 5);
        assert_eq!(s.mean, 3.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 5.0);
        assert!((s.sd - 2.5f64.sqrt()).abs() < 1e-12);
        assert!((s.q025 - 1.1).abs() < 1e-12);
        assert!((s.q975 - 4.9).abs() < 1e-12);

        assert!(SampleSummary::from_samples(&[]).is_none());
        assert!(SampleSummary::from_samples(&[1.0, f64::NAN]).is_none());
        assert_eq!(SampleSummary::from_samples(&[7.0]).unwrap().sd, 0.0);
    }

    #[test]
    fn test_category_frequencies_keep_order() {
        let freqs = category_frequencies(&[2.0, 0.0, 2.0, 2.0], &[2.0, 1.0, 0.0]);
        let keys: Vec<&String> = freqs.keys().collect();
        assert_eq!(keys, vec!["2", "1", "0"]);
        assert_eq!(freqs["2"], 0.75);
        assert_eq!(freqs["1"], 0.0);
        assert_eq!(freqs["0"], 0.25);
    }
}
