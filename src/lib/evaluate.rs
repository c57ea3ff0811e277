//! Monte Carlo evaluation of the sampler against analytic moments.
//!
//! Each replication draws `n_samples` continuous-time values from one shared
//! distribution on its own substream, then estimates the mean and variance
//! with per-replication confidence intervals. The replications are reduced to
//! bias, Monte Carlo standard error (MCSE), mean-square error and coverage.

use crate::correction::CorrectionMode;
use crate::errors::{Error, Sampled};
use crate::matrix::{check_label_count, ProbabilityMatrix};
use crate::sampler::{draw_selection_uniforms, search_cdf, CategoricalSampler};
use crate::stream::{substreams, RandomStream};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};
use tracing::{debug, info};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSettings {
    pub n_reps: usize,
    pub n_samples: usize,
    pub alpha: f64,
    pub true_mean: f64,
    pub true_var: f64,
}

impl EvaluationSettings {
    fn validate(&self) -> Result<(), Error> {
        if self.n_reps < 1 {
            return Err(Error::InvalidParameter {
                name: "n_reps", reason: "at least one replication is required".into(),
            });
        }
        if self.n_samples < 2 {
            return Err(Error::InvalidParameter {
                name: "n_samples", reason: format!("need at least 2 samples, got {}", self.n_samples),
            });
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::InvalidParameter {
                name: "alpha", reason: format!("must lie in (0, 1), got {}", self.alpha),
            });
        }
        if !self.true_mean.is_finite() {
            return Err(Error::InvalidParameter {
                name: "true_mean", reason: format!("must be finite, got {}", self.true_mean),
            });
        }
        if !(self.true_var.is_finite() && self.true_var >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "true_var", reason: format!("must be finite and non-negative, got {}", self.true_var),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub fn centered(center: f64, half_width: f64) -> Self {
        Self { lower: center - half_width, upper: center + half_width }
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }
}

/// Estimates from a single replication.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationResult {
    pub mean: f64,
    pub variance: f64,
    pub se_mean: f64,
    pub se_variance: f64,
    pub ci_mean: Interval,
    pub ci_variance: Interval,
}

/// Critical values shared by every replication.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CriticalValues {
    /// Standard-normal quantile at `1 - alpha/2`.
    pub z: f64,
    /// Chi-square quantile at `alpha/2` with `n_samples - 1` degrees of freedom.
    pub chi_lower: f64,
    /// Chi-square quantile at `1 - alpha/2` with `n_samples - 1` degrees of freedom.
    pub chi_upper: f64,
}

impl CriticalValues {
    pub fn new(alpha: f64, n_samples: usize) -> Result<Self, Error> {
        let normal = Normal::new(0.0, 1.0).map_err(|e| Error::Quantile(e.to_string()))?;
        let chi_squared = ChiSquared::new((n_samples - 1) as f64)
            .map_err(|e| Error::Quantile(e.to_string()))?;
        Ok(Self {
            z: normal.inverse_cdf(1.0 - alpha / 2.0),
            chi_lower: chi_squared.inverse_cdf(alpha / 2.0),
            chi_upper: chi_squared.inverse_cdf(1.0 - alpha / 2.0),
        })
    }
}

impl ReplicationResult {
    pub fn from_samples(samples: &[f64], critical: &CriticalValues) -> Self {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);

        let se_mean = (variance / n).sqrt();
        let se_variance = variance * (2.0 / (n - 1.0)).sqrt();

        Self {
            mean,
            variance,
            se_mean,
            se_variance,
            ci_mean: Interval::centered(mean, critical.z * se_mean),
            ci_variance: Interval {
                lower: (n - 1.0) * variance / critical.chi_upper,
                upper: (n - 1.0) * variance / critical.chi_lower,
            },
        }
    }
}

/// Bias, MCSE, MSE and coverage of one estimator across replications.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorSummary {
    pub estimate: f64,
    pub mean_se: f64,
    pub bias: f64,
    pub mcse_bias: f64,
    pub mse: f64,
    pub ci_bias: Interval,
    pub coverage: f64,
}

impl EstimatorSummary {
    /// `mcse_bias` (and so `ci_bias`) is NaN for a single replication.
    pub fn new(estimates: &[f64], ses: &[f64], intervals: &[Interval], truth: f64, z: f64) -> Self {
        let n_reps = estimates.len() as f64;
        let estimate = estimates.iter().sum::<f64>() / n_reps;
        let mean_se = ses.iter().sum::<f64>() / n_reps;
        let bias = (estimate - truth).abs();

        let squared_error: f64 = estimates.iter().map(|e| (e - truth) * (e - truth)).sum();
        let mcse_bias = if estimates.len() > 1 {
            (squared_error / (n_reps - 1.0) / n_reps).sqrt()
        }
        else {
            f64::NAN
        };
        let mse = squared_error / n_reps;

        let n_covered = intervals.iter().filter(|ci| ci.contains(truth)).count();

        Self {
            estimate,
            mean_se,
            bias,
            mcse_bias,
            mse,
            ci_bias: Interval::centered(bias, z * mcse_bias),
            coverage: n_covered as f64 / n_reps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub n_reps: usize,
    pub n_samples: usize,
    pub alpha: f64,
    pub mean_ev_est: f64,
    pub mean_var_est: f64,
    pub bias_ev_est: f64,
    pub bias_var_est: f64,
    pub coverage_ev_est: f64,
    pub coverage_var_est: f64,
    pub ev: EstimatorSummary,
    pub var: EstimatorSummary,
    #[serde(skip)]
    pub replications: Vec<ReplicationResult>,
}

impl EvaluationResult {
    pub fn from_replications(
        replications: Vec<ReplicationResult>,
        settings: &EvaluationSettings,
        critical: &CriticalValues,
    ) -> Self {
        let means: Vec<f64> = replications.iter().map(|r| r.mean).collect();
        let variances: Vec<f64> = replications.iter().map(|r| r.variance).collect();
        let se_means: Vec<f64> = replications.iter().map(|r| r.se_mean).collect();
        let se_variances: Vec<f64> = replications.iter().map(|r| r.se_variance).collect();
        let ci_means: Vec<Interval> = replications.iter().map(|r| r.ci_mean).collect();
        let ci_variances: Vec<Interval> = replications.iter().map(|r| r.ci_variance).collect();

        let ev = EstimatorSummary::new(&means, &se_means, &ci_means, settings.true_mean, critical.z);
        let var = EstimatorSummary::new(
            &variances, &se_variances, &ci_variances, settings.true_var, critical.z,
        );

        Self {
            n_reps: settings.n_reps,
            n_samples: settings.n_samples,
            alpha: settings.alpha,
            mean_ev_est: ev.estimate,
            mean_var_est: var.estimate,
            bias_ev_est: ev.bias,
            bias_var_est: var.bias,
            coverage_ev_est: ev.coverage,
            coverage_var_est: var.coverage,
            ev,
            var,
            replications,
        }
    }
}

/// A validated evaluation, ready to run against any random stream.
#[derive(Debug, Clone)]
pub struct MonteCarloEvaluator {
    categories: Vec<f64>,
    cdf: Vec<f64>,
    settings: EvaluationSettings,
    critical: CriticalValues,
}

impl MonteCarloEvaluator {
    pub fn new(
        categories: &[f64],
        probs: &[f64],
        settings: EvaluationSettings,
    ) -> Result<Sampled<Self>, Error> {
        settings.validate()?;
        let matrix = ProbabilityMatrix::from_flat(1, probs.len(), probs.to_vec())?;
        check_label_count(categories.len(), matrix.n_cols())?;
        let critical = CriticalValues::new(settings.alpha, settings.n_samples)?;
        let sampler = CategoricalSampler::new(matrix)?;

        Ok(sampler.map(|s| Self {
            categories: categories.to_vec(),
            cdf: s.cdf(0).to_vec(),
            settings,
            critical,
        }))
    }

    pub fn settings(&self) -> &EvaluationSettings {
        &self.settings
    }

    pub fn critical_values(&self) -> &CriticalValues {
        &self.critical
    }

    /// One replication of `n_samples` uniform-corrected draws.
    ///
    /// Consumes the selection draws first, then the correction draws.
    pub fn draw_replication(&self, stream: &mut RandomStream) -> Vec<f64> {
        let uniforms = draw_selection_uniforms(stream, self.settings.n_samples);
        let mut samples: Vec<f64> = uniforms
            .iter()
            .map(|u| self.categories[search_cdf(&self.cdf, *u)])
            .collect();
        CorrectionMode::Uniform.apply(stream, &mut samples);
        samples
    }

    /// All replications as columns of an `n_samples x n_reps` matrix.
    /// Advances `rng` past the `n_reps` substreams it hands out.
    pub fn draw_replications(&self, rng: &mut RandomStream) -> Vec<Vec<f64>> {
        self.map_replications(rng, |samples| samples)
    }

    /// Hands each replication its own jumped substream and maps its draws.
    fn map_replications<T, F>(&self, rng: &mut RandomStream, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(Vec<f64>) -> T + Sync + Send,
    {
        substreams(rng, self.settings.n_reps)
            .into_par_iter()
            .map(|mut stream| f(self.draw_replication(&mut stream)))
            .collect()
    }

    pub fn run(&self, rng: &mut RandomStream) -> EvaluationResult {
        debug!(
            n_reps = self.settings.n_reps,
            n_samples = self.settings.n_samples,
            n_categories = self.categories.len(),
            "starting Monte Carlo evaluation"
        );
        let replications = self.map_replications(rng, |samples| {
            ReplicationResult::from_samples(&samples, &self.critical)
        });

        let result = EvaluationResult::from_replications(replications, &self.settings, &self.critical);
        info!(
            mean_ev_est = result.mean_ev_est,
            mean_var_est = result.mean_var_est,
            coverage_ev_est = result.coverage_ev_est,
            coverage_var_est = result.coverage_var_est,
            "Monte Carlo evaluation finished"
        );
        result
    }
}

/// Validates the inputs, then runs `n_reps` replications of `n_samples`
/// uniform-corrected draws from `probs` over `categories`.
pub fn evaluate(
    rng: &mut RandomStream,
    categories: &[f64],
    probs: &[f64],
    settings: EvaluationSettings,
) -> Result<Sampled<EvaluationResult>, Error> {
    let evaluator = MonteCarloEvaluator::new(categories, probs, settings)?;
    Ok(evaluator.map(|e| e.run(rng)))
}
