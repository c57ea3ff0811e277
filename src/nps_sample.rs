use npstools::config::SampleConfig;
use npstools::errors::*;
use npstools::matrix::resolve_categories;
use npstools::stream::from_seed_or_entropy;
use npstools::summary::{category_frequencies, SampleSummary};
use npstools::util::*;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Serialize)]
struct OutputData {
    rng_seed: u64,
    correction: String,
    n_rows: usize,
    diagnostics: Vec<Diagnostic>,
    summary: Option<SampleSummary>,
    frequencies: Option<IndexMap<String, f64>>,
    samples: Option<Vec<f64>>,
}

fn main() {
    init_logging();
    match run() {
        Ok(output) => {
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    error!("failed to serialize output: {}", e);
                    std::process::exit(1);
                },
            }
        },
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        },
    }
}

fn run() -> Result<OutputData, Error> {
    let json_data = read_input_from_args()?;
    let config: SampleConfig = serde_json::from_str(&json_data)?;

    let matrix = config.distribution.to_matrix()?;
    let n_rows = matrix.n_rows();
    let categories = resolve_categories(config.categories.as_deref(), matrix.n_cols())?;

    let (rng_seed, mut rng) = from_seed_or_entropy(config.rng_seed);
    info!(rng_seed, n_rows, n_categories = categories.len(), correction = %config.correction, "sampling");

    let sampled = npstools::sample(&mut rng, matrix, Some(categories.as_slice()), config.correction)?;

    // Frequencies only make sense for uncorrected draws, which equal a label exactly.
    let frequencies = match config.correction {
        npstools::CorrectionMode::None => Some(category_frequencies(&sampled.value, &categories)),
        npstools::CorrectionMode::Uniform => None,
    };

    Ok(OutputData {
        rng_seed,
        correction: config.correction.to_string(),
        n_rows,
        summary: SampleSummary::from_samples(&sampled.value),
        frequencies,
        samples: if config.write_samples { Some(sampled.value) } else { None },
        diagnostics: sampled.diagnostics,
    })
}
