use crate::correction::CorrectionMode;
use crate::errors::Error;
use crate::evaluate::EvaluationSettings;
use crate::hazard::{corrected_moments, pmf_from_cdf, pmf_from_hazard_rates};
use crate::matrix::{resolve_categories, ProbabilityMatrix};
use serde::{Deserialize, Serialize};

fn default_alpha() -> f64 {
    0.05
}

/// Input for `nps-sample`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SampleConfig {
    pub rng_seed: Option<u64>,
    #[serde(default)]
    pub correction: CorrectionMode,
    pub categories: Option<Vec<f64>>,
    pub distribution: DistributionInput,
    #[serde(default)]
    pub write_samples: bool,
}

/// Per-row distributions, given directly or derived from a curve.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionInput {
    Probabilities(Vec<Vec<f64>>),
    /// Per-unit hazard rates; each row gains a terminal category.
    HazardRates(Vec<Vec<f64>>),
    Cumulative(Vec<Vec<f64>>),
}

impl DistributionInput {
    pub fn to_matrix(&self) -> Result<ProbabilityMatrix, Error> {
        match self {
            DistributionInput::Probabilities(rows) => ProbabilityMatrix::from_rows(rows),
            DistributionInput::HazardRates(rows) => ProbabilityMatrix::from_rows(
                &convert_rows(rows, pmf_from_hazard_rates)?
            ),
            DistributionInput::Cumulative(rows) => ProbabilityMatrix::from_rows(
                &convert_rows(rows, pmf_from_cdf)?
            ),
        }
    }
}

fn convert_rows<F>(rows: &[Vec<f64>], f: F) -> Result<Vec<Vec<f64>>, Error>
where
    F: Fn(&[f64]) -> Result<Vec<f64>, Error>,
{
    rows.iter().enumerate().map(|(i, row)| {
        f(row).map_err(|e| match e {
            Error::InvalidInputKind { column, reason, .. } => Error::InvalidInputKind {
                row: i, column, reason,
            },
            e => e,
        })
    }).collect()
}

/// Input for `nps-evaluate`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluateConfig {
    pub rng_seed: Option<u64>,
    pub n_reps: usize,
    pub n_samples: usize,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    pub categories: Option<Vec<f64>>,
    pub probabilities: Vec<f64>,
    /// Defaults to the analytic mean of the corrected distribution.
    pub true_mean: Option<f64>,
    /// Defaults to the analytic variance of the corrected distribution.
    pub true_var: Option<f64>,
}

impl EvaluateConfig {
    pub fn categories(&self) -> Result<Vec<f64>, Error> {
        resolve_categories(self.categories.as_deref(), self.probabilities.len())
    }

    /// Missing true moments come from the validated, normalized probabilities.
    pub fn settings(&self) -> Result<EvaluationSettings, Error> {
        let pmf = ProbabilityMatrix::from_flat(1, self.probabilities.len(), self.probabilities.clone())?
            .normalize()?
            .into_inner();
        let (mean, var) = corrected_moments(&self.categories()?, pmf.row(0));
        Ok(EvaluationSettings {
            n_reps: self.n_reps,
            n_samples: self.n_samples,
            alpha: self.alpha,
            true_mean: self.true_mean.unwrap_or(mean),
            true_var: self.true_var.unwrap_or(var),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_defaults() {
        let config: SampleConfig = serde_json::from_str(r#"{
            "distribution": {"probabilities": [[0.5, 0.5], [0.1, 0.9]]}
        }"#).unwrap();
        assert_eq!(config.correction, CorrectionMode::None);
        assert!(config.rng_seed.is_none());
        assert!(!config.write_samples);
        let m = config.distribution.to_matrix().unwrap();
        assert_eq!((m.n_rows(), m.n_cols()), (2, 2));
    }

    #[test]
    fn test_sample_config_rejects_bogus_correction() {
        let result = serde_json::from_str::<SampleConfig>(r#"{
            "correction": "bogus",
            "distribution": {"probabilities": [[1.0]]}
        }"#);
        assert!(result.unwrap_err().to_string().contains("'bogus'"));
    }

    #[test]
    fn test_hazard_rates_gain_terminal_category() {
        let config: SampleConfig = serde_json::from_str(r#"{
            "rng_seed": 4,
            "correction": "uniform",
            "distribution": {"hazard_rates": [[0.1, 0.2], [0.3, 0.4]]}
        }"#).unwrap();
        let m = config.distribution.to_matrix().unwrap();
        assert_eq!((m.n_rows(), m.n_cols()), (2, 3));
        for sum in m.row_sums() {
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bad_cumulative_row_is_located() {
        let input = DistributionInput::Cumulative(vec![vec![0.2, 1.0], vec![0.6, 0.5]]);
        match input.to_matrix() {
            Err(Error::InvalidInputKind { row: 1, column: 1, .. }) => {},
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_evaluate_config_default_truth() {
        let config: EvaluateConfig = serde_json::from_str(r#"{
            "n_reps": 10,
            "n_samples": 100,
            "probabilities": [0.5, 0.5]
        }"#).unwrap();
        let settings = config.settings().unwrap();
        assert_eq!(settings.alpha, 0.05);
        assert!((settings.true_mean - 1.0).abs() < 1e-12);
        assert!((settings.true_var - 1.0 / 3.0).abs() < 1e-12);

        let mismatched: EvaluateConfig = serde_json::from_str(r#"{
            "n_reps": 10,
            "n_samples": 100,
            "categories": [1.0],
            "probabilities": [0.5, 0.5]
        }"#).unwrap();
        assert!(matches!(mismatched.settings(), Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_evaluate_config_rejects_bad_probabilities() {
        for probs in ["[1.5, -0.5]", "[0.0, 0.0]", "[]"] {
            let config: EvaluateConfig = serde_json::from_str(&format!(r#"{{
                "n_reps": 10,
                "n_samples": 100,
                "probabilities": {}
            }}"#, probs)).unwrap();
            match config.settings() {
                Err(Error::InvalidInputKind { row: 0, .. }) => {},
                other => panic!("{}: unexpected {:?}", probs, other),
            }
        }

        // Supplied truth does not skip the check.
        let config: EvaluateConfig = serde_json::from_str(r#"{
            "n_reps": 10,
            "n_samples": 100,
            "probabilities": [1.5, -0.5],
            "true_mean": 1.0,
            "true_var": 0.5
        }"#).unwrap();
        assert!(matches!(config.settings(), Err(Error::InvalidInputKind { row: 0, column: 1, .. })));
    }

    #[test]
    fn test_evaluate_config_default_truth_uses_normalized_probabilities() {
        let config: EvaluateConfig = serde_json::from_str(r#"{
            "n_reps": 10,
            "n_samples": 100,
            "probabilities": [2.0, 2.0]
        }"#).unwrap();
        let settings = config.settings().unwrap();
        assert!((settings.true_mean - 1.0).abs() < 1e-12);
        assert!((settings.true_var - 1.0 / 3.0).abs() < 1e-12);
    }
}
