use indicatif::{ProgressBar, ProgressStyle};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;

use crate::{
    model::Parameters,
    settings::Settings,
    simulator::{simulate_patient, PatientResult},
    QspError,
};

use super::{sample_population, PopulationDistribution, PopulationResult};

/// Samples `settings.simulation.n_patients` virtual patients from `distribution`
/// with a generator seeded by `settings.simulation.seed`, simulates them and
/// aggregates the outcomes.
///
/// Configuration problems are returned before any simulation starts.
pub fn simulate_population(
    distribution: &PopulationDistribution,
    settings: &Settings,
) -> Result<PopulationResult, QspError> {
    settings.validate()?;

    let mut rng = StdRng::seed_from_u64(settings.simulation.seed);
    let cohort = sample_population(distribution, settings.simulation.n_patients, &mut rng)?;
    tracing::debug!(
        "Sampled {} virtual patients with seed {}",
        cohort.len(),
        settings.simulation.seed
    );

    simulate_cohort(&cohort, settings)
}

/// Simulates an already sampled cohort and aggregates the outcomes.
///
/// A patient whose integration fails is excluded, it does not abort the batch.
/// The result does not depend on `settings.simulation.parallel`.
pub fn simulate_cohort(
    cohort: &[Parameters],
    settings: &Settings,
) -> Result<PopulationResult, QspError> {
    if cohort.is_empty() {
        return Err(QspError::InvalidPatientCount);
    }
    settings.solver.validate()?;

    tracing::info!(
        "Simulating {} virtual patients ({})",
        cohort.len(),
        if settings.simulation.parallel {
            "parallel"
        } else {
            "sequential"
        }
    );
    let start = std::time::Instant::now();

    let progress = if settings.simulation.progress {
        let pb = ProgressBar::new(cohort.len() as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} patients ({eta})")
        {
            pb.set_style(style.progress_chars("##-"));
        }
        Some(pb)
    } else {
        None
    };

    let run = |(index, params): (usize, &Parameters)| -> Result<PatientResult, QspError> {
        let outcome = simulate_patient(params, &settings.solver);
        match &outcome {
            Ok(result) => tracing::debug!(
                patient = index,
                "baseline EASI {:.3}",
                result.baseline_score()
            ),
            Err(err) => tracing::debug!(patient = index, "simulation failed: {}", err),
        }
        if let Some(pb) = &progress {
            pb.inc(1);
        }
        outcome
    };

    let outcomes: Vec<Result<PatientResult, QspError>> = if settings.simulation.parallel {
        cohort.par_iter().enumerate().map(run).collect()
    } else {
        cohort.iter().enumerate().map(run).collect()
    };

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let result = PopulationResult::from_outcomes(outcomes)?;
    tracing::info!(
        "Population done in {:.2?}: {} retained, {} excluded",
        start.elapsed(),
        result.n_retained(),
        result.n_excluded()
    );
    Ok(result)
}
