pub(crate) mod ode;
mod patient;

use ndarray::{Array2, ArrayView1};

use crate::model::{StateVector, NSTATES};

pub use ode::integrate;
pub use patient::{simulate_patient, PatientResult};

/// Spacing of the output grid, in weeks.
pub const STEP_WEEKS: f64 = 0.1;

/// Length of the drug-free run used to reach each patient's steady state.
pub const EQUILIBRATION_WEEKS: f64 = 1000.0;

/// Length of every treatment arm.
pub const TREATMENT_WEEKS: f64 = 24.0;

/// Grid points of a treatment arm, both endpoints included.
pub const TREATMENT_POINTS: usize = 241;

/// Output times for a run of `horizon` weeks: `round(horizon / STEP_WEEKS) + 1`
/// evenly spaced points from 0 to `horizon` inclusive.
pub fn time_grid(horizon: f64) -> Vec<f64> {
    let n = (horizon / STEP_WEEKS).round() as usize + 1;
    if n == 1 {
        return vec![0.0];
    }
    let step = horizon / (n - 1) as f64;
    let mut times: Vec<f64> = (0..n).map(|i| i as f64 * step).collect();
    times[n - 1] = horizon;
    times
}

/// States sampled on a fixed time grid by one integrator run.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    times: Vec<f64>,
    /// One row per time point, one column per compartment
    states: Array2<f64>,
}

impl Trajectory {
    pub fn new(times: Vec<f64>, states: Array2<f64>) -> Self {
        debug_assert_eq!(times.len(), states.nrows());
        debug_assert_eq!(states.ncols(), NSTATES);
        Self { times, states }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &Array2<f64> {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// State at grid index `index`.
    pub fn state(&self, index: usize) -> Option<StateVector> {
        if index >= self.len() {
            return None;
        }
        let mut state = [0.0; NSTATES];
        state
            .iter_mut()
            .zip(self.states.row(index))
            .for_each(|(s, &v)| *s = v);
        Some(state)
    }

    pub fn last_state(&self) -> Option<StateVector> {
        self.len().checked_sub(1).and_then(|last| self.state(last))
    }

    /// Level of compartment `index` over time.
    pub fn column(&self, index: usize) -> ArrayView1<'_, f64> {
        self.states.column(index)
    }
}
