pub mod error;
pub mod intervention;
pub mod logger;
pub mod model;
pub mod population;
pub mod settings;
pub mod simulator;

pub use error::QspError;
pub use intervention::{DrugEffect, Intervention};
pub use model::Parameters;
pub use population::{simulate_population, PopulationDistribution, PopulationResult};
pub use settings::Settings;
pub use simulator::{simulate_patient, PatientResult};

// ============================================================================
// Traits for typed parameters
// ============================================================================

/// Trait for typed parameter structs.
///
/// Gives positional access to named rate constants, in the order they appear
/// in a population distribution file.
pub trait Params: Sized {
    /// Returns the names of all parameter fields
    fn field_names() -> &'static [&'static str];

    /// Returns the number of parameters
    fn num_params() -> usize;

    /// Create from a slice of values (in field order)
    fn from_slice(values: &[f64]) -> Self;

    /// Convert to a vector of values (in field order)
    fn to_vec(&self) -> Vec<f64>;
}

pub mod prelude {
    pub mod model {
        pub use crate::model::{
            baseline_factor_names, drift, easi, easi_series, Compartment, Parameters,
            StateVector, EASI_MAX, INITIAL_STATE, NPARAMS, NSTATES,
        };
    }
    pub mod simulator {
        pub use crate::simulator::{
            integrate, simulate_patient, time_grid, PatientResult, Trajectory,
            EQUILIBRATION_WEEKS, STEP_WEEKS, TREATMENT_POINTS, TREATMENT_WEEKS,
        };
    }
    pub mod population {
        pub use crate::population::{
            sample_population, simulate_cohort, simulate_population, Exclusion,
            ExclusionReason, PopulationDistribution, PopulationResult, RESPONDER_THRESHOLD,
        };
    }

    pub use crate::intervention::{DrugEffect, Il13Binding, Intervention, Production};
    pub use crate::logger::setup_log;
    pub use crate::settings::{Settings, SolverSettings};
    pub use crate::{Params, QspError};
}
