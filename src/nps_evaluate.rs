use npstools::config::EvaluateConfig;
use npstools::errors::*;
use npstools::evaluate::{EvaluationResult, MonteCarloEvaluator};
use npstools::stream::from_seed_or_entropy;
use npstools::util::*;

use serde::Serialize;
use std::time::Instant;
use tracing::{error, info};

#[derive(Debug, Serialize)]
struct OutputData {
    rng_seed: u64,
    true_mean: f64,
    true_var: f64,
    diagnostics: Vec<Diagnostic>,
    result: EvaluationResult,
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
    let config: EvaluateConfig = serde_json::from_str(&json_data)?;

    let categories = config.categories()?;
    let settings = config.settings()?;
    let evaluator = MonteCarloEvaluator::new(&categories, &config.probabilities, settings)?;

    let (rng_seed, mut rng) = from_seed_or_entropy(config.rng_seed);
    let start = Instant::now();
    let result = evaluator.value.run(&mut rng);
    info!(rng_seed, elapsed_s = start.elapsed().as_secs_f64(), "evaluation done");

    Ok(OutputData {
        rng_seed,
        true_mean: settings.true_mean,
        true_var: settings.true_var,
        diagnostics: evaluator.diagnostics,
        result,
    })
}
