use adqsp::prelude::model::*;
use adqsp::prelude::simulator::*;
use adqsp::prelude::*;
use approx::assert_relative_eq;

fn settings() -> SolverSettings {
    SolverSettings::default()
}

#[test]
fn repeated_runs_are_bit_identical() {
    let x = Parameters::uniform(1.0);
    let a = simulate_patient(&x, &settings()).unwrap();
    let b = simulate_patient(&x, &settings()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn result_shapes() {
    let result = simulate_patient(&Parameters::uniform(1.0), &settings()).unwrap();
    assert_eq!(result.scores().dim(), (TREATMENT_POINTS, Intervention::ALL.len()));
    assert_eq!(result.baseline_factors().len(), 15);
    assert_eq!(baseline_factor_names().len(), 15);
}

#[test]
fn scores_stay_on_the_easi_scale() {
    let result = simulate_patient(&Parameters::uniform(1.0), &settings()).unwrap();
    assert!(result
        .scores()
        .iter()
        .all(|&score| (0.0..EASI_MAX).contains(&score)));
    assert!(result.baseline_score() >= 0.0 && result.baseline_score() < EASI_MAX);
}

#[test]
fn every_arm_starts_at_baseline() {
    let result = simulate_patient(&Parameters::uniform(1.0), &settings()).unwrap();
    for arm in Intervention::ALL {
        assert_eq!(result.arm(arm)[0], result.baseline_score());
    }
}

#[test]
fn steady_state_is_a_fixed_point_of_the_drug_free_model() {
    let x = Parameters::uniform(1.0);
    let result = simulate_patient(&x, &settings()).unwrap();
    let steady = *result.steady_state();

    let mut rate = [0.0; NSTATES];
    drift(&steady, 0.0, &DrugEffect::EQUILIBRATION, &x, &mut rate);
    assert!(rate.iter().all(|r| r.abs() < 1e-4), "drift {:?}", rate);

    let trajectory =
        integrate(&steady, TREATMENT_WEEKS, &DrugEffect::EQUILIBRATION, &x, &settings()).unwrap();
    let end = trajectory.last_state().unwrap();
    for (a, b) in steady.iter().zip(end.iter()) {
        assert_relative_eq!(a, b, max_relative = 1e-5, epsilon = 1e-8);
    }
}

/// Largest distance, in EASI points, between the placebo course and the baseline score.
const PLACEBO_DRIFT_TOLERANCE: f64 = 3.0;

#[test]
fn placebo_stays_near_the_baseline_score() {
    for value in [0.5, 1.0, 2.0] {
        let result = simulate_patient(&Parameters::uniform(value), &settings()).unwrap();
        let baseline = result.baseline_score();
        let drift = result
            .arm(Intervention::Placebo)
            .iter()
            .map(|score| (score - baseline).abs())
            .fold(0.0, f64::max);
        assert!(
            drift < PLACEBO_DRIFT_TOLERANCE,
            "placebo drifted {} EASI points from baseline {} (constants = {})",
            drift,
            baseline,
            value
        );
    }
}

#[test]
fn il22_blockade_changes_the_course() {
    let result = simulate_patient(&Parameters::uniform(1.0), &settings()).unwrap();
    let placebo = result.arm(Intervention::Placebo);
    let fezakinumab = result.arm(Intervention::Fezakinumab);
    let last = TREATMENT_POINTS - 1;
    assert!((placebo[last] - fezakinumab[last]).abs() > 1e-6);
}

#[test]
fn equilibration_starts_from_the_reference_state() {
    let x = Parameters::uniform(1.0);
    let trajectory =
        integrate(&INITIAL_STATE, 1.0, &DrugEffect::EQUILIBRATION, &x, &settings()).unwrap();
    assert_eq!(trajectory.state(0).unwrap(), INITIAL_STATE);
    assert_eq!(trajectory.len(), 11);
    assert_eq!(trajectory.times()[10], 1.0);
}
