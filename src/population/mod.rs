//! Virtual populations: sampling patients, running the trial and summarising it.

mod aggregate;
mod distribution;
mod output;
mod run;
mod sampler;

pub use aggregate::{
    check_validity, Exclusion, ExclusionReason, PopulationResult, RESPONDER_THRESHOLD,
};
pub use distribution::PopulationDistribution;
pub use run::{simulate_cohort, simulate_population};
pub use sampler::sample_population;
