use ndarray::Array1;

use crate::simulator::Trajectory;

use super::Compartment;

/// Upper end of the EASI scale. Scores at or above it mark a degenerate trajectory.
pub const EASI_MAX: f64 = 72.0;

/// EASI severity of a single state: `18·(p + (1 − s))`, the pathogen burden
/// plus the barrier deficit rescaled onto the 0–72 scale.
#[inline(always)]
pub fn easi(state: &[f64]) -> f64 {
    score(
        state[Compartment::Barrier.index()],
        state[Compartment::Pathogen.index()],
    )
}

/// EASI score at every point of a trajectory.
pub fn easi_series(trajectory: &Trajectory) -> Array1<f64> {
    let states = trajectory.states();
    let s = states.column(Compartment::Barrier.index());
    let p = states.column(Compartment::Pathogen.index());
    ndarray::Zip::from(&s)
        .and(&p)
        .map_collect(|&s, &p| score(s, p))
}

#[inline(always)]
fn score(barrier: f64, pathogen: f64) -> f64 {
    EASI_MAX * (2.0 * pathogen + 2.0 * (1.0 - barrier)) / 4.0
}
