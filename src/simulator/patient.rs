use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    intervention::{DrugEffect, Intervention, NINTERVENTIONS},
    model::{easi, easi_series, Parameters, StateVector, INITIAL_STATE, NSTATES},
    settings::SolverSettings,
    QspError,
};

use super::{integrate, EQUILIBRATION_WEEKS, TREATMENT_POINTS, TREATMENT_WEEKS};

/// Outcome of simulating one virtual patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientResult {
    baseline_score: f64,
    steady_state: StateVector,
    /// EASI over time, one row per grid point and one column per [Intervention]
    scores: Array2<f64>,
}

impl PatientResult {
    /// Assembles a result, checking that `scores` is `TREATMENT_POINTS × NINTERVENTIONS`.
    pub fn new(
        baseline_score: f64,
        steady_state: StateVector,
        scores: Array2<f64>,
    ) -> Result<Self, QspError> {
        if scores.dim() != (TREATMENT_POINTS, NINTERVENTIONS) {
            return Err(QspError::InvalidLength {
                name: "score matrix".to_string(),
                expected: TREATMENT_POINTS * NINTERVENTIONS,
                found: scores.len(),
            });
        }
        Ok(Self {
            baseline_score,
            steady_state,
            scores,
        })
    }

    /// EASI at the drug-free steady state.
    pub fn baseline_score(&self) -> f64 {
        self.baseline_score
    }

    pub fn steady_state(&self) -> &StateVector {
        &self.steady_state
    }

    pub fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    /// EASI time course of one arm.
    pub fn arm(&self, intervention: Intervention) -> ArrayView1<'_, f64> {
        self.scores.column(intervention.index())
    }

    /// Baseline score followed by the 14 steady-state levels.
    pub fn baseline_factors(&self) -> [f64; NSTATES + 1] {
        let mut factors = [0.0; NSTATES + 1];
        factors[0] = self.baseline_score;
        factors[1..].copy_from_slice(&self.steady_state);
        factors
    }
}

/// Runs the full protocol for one patient.
///
/// The patient is first equilibrated drug-free for [EQUILIBRATION_WEEKS] from
/// [INITIAL_STATE]; the last state of that run is its individual baseline.
/// Every arm of the catalog is then integrated for [TREATMENT_WEEKS] from that
/// baseline and scored. Arms are independent and run in parallel.
pub fn simulate_patient(
    params: &Parameters,
    settings: &SolverSettings,
) -> Result<PatientResult, QspError> {
    let equilibrium = integrate(
        &INITIAL_STATE,
        EQUILIBRATION_WEEKS,
        &DrugEffect::EQUILIBRATION,
        params,
        settings,
    )
    .map_err(|e| in_phase(e, "equilibration"))?;

    let steady_state = equilibrium
        .last_state()
        .ok_or_else(|| QspError::integration("equilibration", "empty trajectory"))?;
    let baseline_score = easi(&steady_state);

    let series: Vec<Array1<f64>> = Intervention::ALL
        .par_iter()
        .map(|arm| {
            integrate(
                &steady_state,
                TREATMENT_WEEKS,
                &arm.effect(),
                params,
                settings,
            )
            .map(|trajectory| easi_series(&trajectory))
            .map_err(|e| in_phase(e, &format!("{} arm", arm.name())))
        })
        .collect::<Result<_, _>>()?;

    let mut scores = Array2::zeros((TREATMENT_POINTS, NINTERVENTIONS));
    for (mut column, arm) in scores.columns_mut().into_iter().zip(series.iter()) {
        column.assign(arm);
    }

    tracing::trace!(baseline_score, "patient simulated");
    PatientResult::new(baseline_score, steady_state, scores)
}

fn in_phase(err: QspError, phase: &str) -> QspError {
    match err {
        QspError::Integration { message, .. } => QspError::integration(phase, message),
        other => other,
    }
}
