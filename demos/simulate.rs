//! Runs a virtual trial and writes the population outputs.
//!
//! ```text
//! cargo run --release --example simulate -- [settings.toml] [mu.csv sigma.csv]
//! ```
//!
//! Without distribution files every log-parameter is centred on zero with a
//! spread of 0.1.

use adqsp::prelude::model::NPARAMS;
use adqsp::prelude::*;
use adqsp::{simulate_population, PopulationDistribution};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let settings = match args.first() {
        Some(path) => Settings::from_file(path)?,
        None => Settings::new().with_patients(20).with_progress(),
    };
    setup_log(&settings)?;

    let distribution = match (args.get(1), args.get(2)) {
        (Some(mu), Some(sigma)) => PopulationDistribution::from_csv(mu, sigma)?,
        _ => PopulationDistribution::new(vec![0.0; NPARAMS], vec![0.1; NPARAMS])?,
    };

    let result = simulate_population(&distribution, &settings)?;
    for exclusion in result.exclusions() {
        tracing::info!("patient {} excluded: {}", exclusion.patient, exclusion.reason);
    }

    let last = result.responder_rate().nrows() - 1;
    for arm in Intervention::ALL {
        tracing::info!(
            "{:>13}: {:6.2}% mean improvement, {:6.2}% EASI-75 at week 24",
            arm.name(),
            result.mean_improvement()[[last, arm.index()]],
            result.responder_rate()[[last, arm.index()]]
        );
    }

    result.write_csv("output")?;
    std::fs::write("output/population.json", result.to_json()?)?;
    Ok(())
}
