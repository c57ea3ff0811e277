//! Nonparametric sampling of times to event from discretized distributions,
//! and Monte Carlo evaluation of the sampler's accuracy.

pub mod errors;
pub mod util;
pub mod stream;
pub mod matrix;
pub mod sampler;
pub mod correction;
pub mod evaluate;
pub mod hazard;
pub mod summary;
pub mod config;

pub use correction::{sample, CorrectionMode};
pub use errors::{Diagnostic, Error, Sampled};
pub use evaluate::{evaluate, EvaluationResult, EvaluationSettings, MonteCarloEvaluator};
pub use matrix::ProbabilityMatrix;
pub use sampler::{sample_labels, CategoricalSampler};
pub use stream::RandomStream;
