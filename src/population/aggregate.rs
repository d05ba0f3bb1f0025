use ndarray::{s, Array1, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::{
    intervention::{Intervention, NINTERVENTIONS},
    model::{EASI_MAX, NSTATES},
    simulator::{time_grid, PatientResult, TREATMENT_POINTS, TREATMENT_WEEKS},
    QspError,
};

/// Percent improvement from baseline that counts as an EASI-75 response.
pub const RESPONDER_THRESHOLD: f64 = 75.0;

/// Why a virtual patient was left out of the population statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExclusionReason {
    /// The ODE solver could not complete one of the patient's runs
    IntegrationFailure { message: String },
    /// An arm reached the top of the EASI scale (or produced a non-finite score)
    ScoreCeiling {
        intervention: Intervention,
        time: f64,
        score: f64,
    },
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::IntegrationFailure { message } => {
                write!(f, "integration failure: {}", message)
            }
            ExclusionReason::ScoreCeiling {
                intervention,
                time,
                score,
            } => write!(
                f,
                "EASI {} at week {:.1} of the {} arm",
                score, time, intervention
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    /// Position of the patient in the simulated cohort
    pub patient: usize,
    pub reason: ExclusionReason,
}

/// Returns the first arm score that is not strictly below [EASI_MAX], if any.
pub fn check_validity(result: &PatientResult) -> Option<ExclusionReason> {
    let times = time_grid(TREATMENT_WEEKS);
    Intervention::ALL.iter().find_map(|&intervention| {
        result
            .arm(intervention)
            .iter()
            .zip(times.iter())
            .find(|(score, _)| !(**score < EASI_MAX))
            .map(|(&score, &time)| ExclusionReason::ScoreCeiling {
                intervention,
                time,
                score,
            })
    })
}

/// Population-level summary of a virtual trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationResult {
    n_patients: usize,
    retained: Vec<usize>,
    exclusions: Vec<Exclusion>,
    /// Mean of the 15 baseline factors (EASI and the 14 states)
    baseline_mean: Array1<f64>,
    /// Percent coefficient of variation of the 15 baseline factors
    baseline_cv: Array1<f64>,
    /// Percent EASI improvement, `retained × time × intervention`
    improvement: Array3<f64>,
    mean_improvement: Array2<f64>,
    /// Percent of retained patients reaching EASI-75, `time × intervention`
    responder_rate: Array2<f64>,
}

impl PopulationResult {
    /// Filters and reduces per-patient outcomes, in cohort order.
    ///
    /// Failed simulations and patients with any arm score `>= 72` are excluded
    /// with a recorded reason. Returns [QspError::DegeneratePopulation] when
    /// nobody is left.
    pub fn from_outcomes(
        outcomes: Vec<Result<PatientResult, QspError>>,
    ) -> Result<Self, QspError> {
        let n_patients = outcomes.len();
        if n_patients == 0 {
            return Err(QspError::InvalidPatientCount);
        }

        let mut retained = Vec::with_capacity(n_patients);
        let mut kept = Vec::with_capacity(n_patients);
        let mut exclusions = Vec::new();
        for (patient, outcome) in outcomes.into_iter().enumerate() {
            let reason = match outcome {
                Ok(result) => match check_validity(&result) {
                    None => {
                        retained.push(patient);
                        kept.push(result);
                        continue;
                    }
                    Some(reason) => reason,
                },
                Err(err) => ExclusionReason::IntegrationFailure {
                    message: err.to_string(),
                },
            };
            tracing::warn!(patient, "excluded: {}", reason);
            exclusions.push(Exclusion { patient, reason });
        }

        if kept.is_empty() {
            return Err(QspError::DegeneratePopulation {
                requested: n_patients,
                excluded: exclusions.len(),
            });
        }
        let n = kept.len();
        // Improvement is relative to baseline. A positive pathogen inflow (d8 > 0)
        // keeps every reachable baseline score above zero.
        debug_assert!(
            kept.iter().all(|r| r.baseline_score() > 0.0),
            "retained patient with a non-positive baseline score"
        );

        let baseline = Array2::from_shape_fn((n, NSTATES + 1), |(p, f)| {
            kept[p].baseline_factors()[f]
        });
        let baseline_mean = baseline.sum_axis(Axis(0)) / n as f64;
        let baseline_std = baseline.std_axis(Axis(0), 0.0);
        let baseline_cv = 100.0 * &baseline_std / &baseline_mean;

        let improvement = Array3::from_shape_fn(
            (n, TREATMENT_POINTS, NINTERVENTIONS),
            |(p, t, a)| {
                let baseline = kept[p].baseline_score();
                100.0 * (baseline - kept[p].scores()[[t, a]]) / baseline
            },
        );
        let mean_improvement = improvement.sum_axis(Axis(0)) / n as f64;
        let responder_rate =
            Array2::from_shape_fn((TREATMENT_POINTS, NINTERVENTIONS), |(t, a)| {
                let responders = improvement
                    .slice(s![.., t, a])
                    .iter()
                    .filter(|&&v| v > RESPONDER_THRESHOLD)
                    .count();
                100.0 * responders as f64 / n as f64
            });

        Ok(Self {
            n_patients,
            retained,
            exclusions,
            baseline_mean,
            baseline_cv,
            improvement,
            mean_improvement,
            responder_rate,
        })
    }

    /// Number of patients that were simulated.
    pub fn n_patients(&self) -> usize {
        self.n_patients
    }

    pub fn n_retained(&self) -> usize {
        self.retained.len()
    }

    pub fn n_excluded(&self) -> usize {
        self.exclusions.len()
    }

    /// Cohort positions of the patients used in the statistics.
    pub fn retained(&self) -> &[usize] {
        &self.retained
    }

    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    /// True when every simulated patient was retained.
    pub fn is_complete(&self) -> bool {
        self.exclusions.is_empty()
    }

    pub fn baseline_mean(&self) -> &Array1<f64> {
        &self.baseline_mean
    }

    pub fn baseline_cv(&self) -> &Array1<f64> {
        &self.baseline_cv
    }

    /// Per-patient percent EASI improvement, `retained × time × intervention`.
    pub fn improvement(&self) -> &Array3<f64> {
        &self.improvement
    }

    /// Percent EASI improvement averaged over retained patients, `time × intervention`.
    pub fn mean_improvement(&self) -> &Array2<f64> {
        &self.mean_improvement
    }

    /// EASI-75 responder rate in percent, `time × intervention`.
    pub fn responder_rate(&self) -> &Array2<f64> {
        &self.responder_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::INITIAL_STATE;
    use approx::assert_relative_eq;

    /// Patient whose arm scores fall linearly from `baseline` to `end`.
    fn synthetic(baseline: f64, end: f64) -> PatientResult {
        let scores = Array2::from_shape_fn((TREATMENT_POINTS, NINTERVENTIONS), |(t, _)| {
            baseline + (end - baseline) * t as f64 / (TREATMENT_POINTS - 1) as f64
        });
        let mut state = INITIAL_STATE;
        state[0] = baseline / 100.0;
        PatientResult::new(baseline, state, scores).unwrap()
    }

    #[test]
    fn ceiling_patient_is_dropped() {
        let mut scores = synthetic(20.0, 10.0).scores().clone();
        scores[[57, Intervention::Rifng.index()]] = 72.0;
        let runaway = PatientResult::new(20.0, INITIAL_STATE, scores).unwrap();

        let result = PopulationResult::from_outcomes(vec![
            Ok(synthetic(20.0, 4.0)),
            Ok(runaway),
            Ok(synthetic(30.0, 3.0)),
        ])
        .unwrap();

        assert_eq!(result.n_patients(), 3);
        assert_eq!(result.retained(), &[0, 2]);
        assert!(!result.is_complete());
        assert_eq!(result.exclusions().len(), 1);
        let exclusion = &result.exclusions()[0];
        assert_eq!(exclusion.patient, 1);
        match &exclusion.reason {
            ExclusionReason::ScoreCeiling {
                intervention,
                time,
                score,
            } => {
                assert_eq!(*intervention, Intervention::Rifng);
                assert_relative_eq!(*time, 5.7, epsilon = 1e-9);
                assert_eq!(*score, 72.0);
            }
            other => panic!("unexpected reason {:?}", other),
        }

        // Statistics only see patients 0 and 2
        assert_relative_eq!(result.baseline_mean()[0], 25.0);
        assert_relative_eq!(result.baseline_cv()[0], 20.0, epsilon = 1e-12);
        // Final improvements are 80% and 90%
        let last = TREATMENT_POINTS - 1;
        assert_relative_eq!(result.mean_improvement()[[last, 0]], 85.0, epsilon = 1e-9);
        assert_eq!(result.responder_rate()[[last, 0]], 100.0);
        assert_eq!(result.responder_rate()[[0, 0]], 0.0);
    }

    #[test]
    fn nan_scores_are_excluded() {
        let mut scores = synthetic(20.0, 10.0).scores().clone();
        scores[[3, 0]] = f64::NAN;
        let broken = PatientResult::new(20.0, INITIAL_STATE, scores).unwrap();
        assert!(matches!(
            check_validity(&broken),
            Some(ExclusionReason::ScoreCeiling { .. })
        ));
        assert!(check_validity(&synthetic(20.0, 10.0)).is_none());
    }

    #[test]
    fn integration_failures_are_recorded() {
        let result = PopulationResult::from_outcomes(vec![
            Err(QspError::integration("equilibration", "step size too small")),
            Ok(synthetic(20.0, 10.0)),
        ])
        .unwrap();
        assert_eq!(result.n_retained(), 1);
        assert!(matches!(
            result.exclusions()[0].reason,
            ExclusionReason::IntegrationFailure { .. }
        ));
    }

    #[test]
    fn no_survivors_is_degenerate() {
        let mut scores = synthetic(20.0, 10.0).scores().clone();
        scores[[0, 0]] = 80.0;
        let runaway = PatientResult::new(20.0, INITIAL_STATE, scores).unwrap();
        let err = PopulationResult::from_outcomes(vec![
            Ok(runaway),
            Err(QspError::integration("placebo arm", "diverged")),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            QspError::DegeneratePopulation {
                requested: 2,
                excluded: 2
            }
        ));
    }

    #[test]
    fn responder_rate_counts_strictly_above_threshold() {
        // Exactly 75% improvement does not count as a response
        let result = PopulationResult::from_outcomes(vec![
            Ok(synthetic(20.0, 5.0)),
            Ok(synthetic(20.0, 4.0)),
            Ok(synthetic(20.0, 10.0)),
            Ok(synthetic(20.0, 2.0)),
        ])
        .unwrap();
        let last = TREATMENT_POINTS - 1;
        for a in 0..NINTERVENTIONS {
            assert_relative_eq!(result.responder_rate()[[last, a]], 50.0);
        }
        assert!(result
            .responder_rate()
            .iter()
            .all(|&r| (0.0..=100.0).contains(&r)));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "non-positive baseline score")]
    fn zero_baseline_is_rejected() {
        let _ = PopulationResult::from_outcomes(vec![
            Ok(synthetic(20.0, 10.0)),
            Ok(synthetic(0.0, 0.0)),
        ]);
    }

    #[test]
    fn output_shapes() {
        let result = PopulationResult::from_outcomes(vec![Ok(synthetic(20.0, 10.0))]).unwrap();
        assert_eq!(result.baseline_mean().len(), 15);
        assert_eq!(result.baseline_cv().len(), 15);
        assert_eq!(result.mean_improvement().dim(), (241, 10));
        assert_eq!(result.responder_rate().dim(), (241, 10));
        assert_eq!(result.improvement().dim(), (1, 241, 10));
        assert!(result.baseline_cv().iter().all(|&cv| cv == 0.0));
    }
}
