//! Continuous-time correction of discrete draws.

use crate::errors::{Error, Sampled};
use crate::matrix::ProbabilityMatrix;
use crate::sampler::sample_categories;
use rand::distributions::Standard;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CorrectionMode {
    /// Keep the left edge of each category.
    None,
    /// Add an independent U[0, 1) draw to each category.
    Uniform,
}

impl Default for CorrectionMode {
    fn default() -> Self {
        CorrectionMode::None
    }
}

impl FromStr for CorrectionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "none" => Ok(CorrectionMode::None),
            "uniform" => Ok(CorrectionMode::Uniform),
            _ => Err(Error::InvalidCorrectionMode(s.into())),
        }
    }
}

impl TryFrom<String> for CorrectionMode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Error> {
        s.parse()
    }
}

impl From<CorrectionMode> for String {
    fn from(mode: CorrectionMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for CorrectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionMode::None => write!(f, "none"),
            CorrectionMode::Uniform => write!(f, "uniform"),
        }
    }
}

impl CorrectionMode {
    /// Applies the correction in place. `uniform` consumes exactly one draw
    /// per element, in element order.
    pub fn apply<R: Rng + ?Sized>(self, rng: &mut R, samples: &mut [f64]) {
        match self {
            CorrectionMode::None => {},
            CorrectionMode::Uniform => {
                for x in samples.iter_mut() {
                    let offset: f64 = rng.sample(Standard);
                    *x += offset;
                }
            },
        }
    }
}

/// Draws one category per row, then applies `correction`.
///
/// Selection draws for all rows are consumed before any correction draw.
pub fn sample<R: Rng + ?Sized>(
    rng: &mut R,
    matrix: ProbabilityMatrix,
    categories: Option<&[f64]>,
    correction: CorrectionMode,
) -> Result<Sampled<Vec<f64>>, Error> {
    let mut samples = sample_categories(rng, matrix, categories)?;
    correction.apply(rng, &mut samples.value);
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::seeded;
    use proptest::prelude::{any, prop_assert, proptest, ProptestConfig};

    #[test]
    fn test_parse() {
        assert_eq!("none".parse::<CorrectionMode>().unwrap(), CorrectionMode::None);
        assert_eq!("uniform".parse::<CorrectionMode>().unwrap(), CorrectionMode::Uniform);
        match "bogus".parse::<CorrectionMode>() {
            Err(Error::InvalidCorrectionMode(s)) => assert_eq!(s, "bogus"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!("Uniform".parse::<CorrectionMode>().is_err());
    }

    #[test]
    fn test_serde() {
        let mode: CorrectionMode = serde_json::from_str("\"uniform\"").unwrap();
        assert_eq!(mode, CorrectionMode::Uniform);
        assert_eq!(serde_json::to_string(&CorrectionMode::None).unwrap(), "\"none\"");

        let err = serde_json::from_str::<CorrectionMode>("\"bogus\"").unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_none_leaves_samples_and_stream_untouched() {
        let mut samples = vec![1.0, 5.0, 2.0];
        let mut rng = seeded(11);
        CorrectionMode::None.apply(&mut rng, &mut samples);
        assert_eq!(samples, vec![1.0, 5.0, 2.0]);
        assert_eq!(rng.gen::<u64>(), seeded(11).gen::<u64>());
    }

    #[test]
    fn test_uniform_uses_second_independent_draw() {
        let m = ProbabilityMatrix::repeated(&[0.25; 4], 4).unwrap();
        let discrete = sample(&mut seeded(1234), m.clone(), None, CorrectionMode::None).unwrap().value;
        let corrected = sample(&mut seeded(1234), m, None, CorrectionMode::Uniform).unwrap().value;
        for (c, v) in discrete.iter().zip(&corrected) {
            assert!(*c <= *v && *v < c + 1.0);
        }

        // The offsets are the draws that follow the four selection draws.
        let mut rng = seeded(1234);
        let _ = crate::sampler::draw_selection_uniforms(&mut rng, 4);
        for (c, v) in discrete.iter().zip(&corrected) {
            let offset: f64 = rng.sample(Standard);
            assert_eq!(*v, c + offset);
        }
    }

    #[test]
    fn test_corrected_mean_removes_left_edge_bias() {
        // Uniform over 0..10; discrete mean 4.5, continuous mean 5.0.
        let m = ProbabilityMatrix::repeated(&[0.1; 10], 200_000).unwrap();
        let corrected = sample(&mut seeded(77), m, None, CorrectionMode::Uniform).unwrap().value;
        let mean = corrected.iter().sum::<f64>() / corrected.len() as f64;
        assert!((mean - 5.0).abs() < 0.03, "mean = {}", mean);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn uniform_correction_stays_in_bucket(
            discrete in proptest::collection::vec(-50i32..50, 1..200),
            seed in any::<u64>(),
        ) {
            let mut samples: Vec<f64> = discrete.iter().map(|x| *x as f64).collect();
            CorrectionMode::Uniform.apply(&mut seeded(seed), &mut samples);
            for (c, v) in discrete.iter().zip(&samples) {
                let c = *c as f64;
                prop_assert!(c <= *v && *v < c + 1.0);
            }
        }
    }
}
