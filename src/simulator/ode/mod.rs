use diffsol::{
    error::{DiffsolError, OdeSolverError},
    ode_solver::method::OdeSolverMethod,
    NalgebraLU, OdeBuilder, OdeSolverStopReason,
};
use ndarray::{Array2, ArrayView1};

use crate::{
    intervention::DrugEffect,
    model::{drift, jacobian_vector_product, Parameters, StateVector, NSTATES},
    settings::SolverSettings,
    QspError,
};

use super::{time_grid, Trajectory};

type V = nalgebra::DVector<f64>;
type M = nalgebra::DMatrix<f64>;

fn solver_failure(horizon: f64, err: impl std::fmt::Display) -> QspError {
    QspError::integration(format!("a {horizon} week run"), err.to_string())
}

/// Integrates the skin model from `initial` over `horizon` weeks with the BDF
/// solver and samples the solution on [time_grid].
///
/// The solver is forced to stop on every grid point, so the returned states
/// are solver states, not interpolants. Any solver error, or running past
/// `settings.max_steps` internal steps, is reported as [QspError::Integration].
/// Non-finite states that the solver accepts are returned as they are.
pub fn integrate(
    initial: &StateVector,
    horizon: f64,
    effect: &DrugEffect,
    params: &Parameters,
    settings: &SolverSettings,
) -> Result<Trajectory, QspError> {
    let times = time_grid(horizon);
    let mut states = Array2::zeros((times.len(), NSTATES));
    states.row_mut(0).assign(&ArrayView1::from(initial));

    let (de, x, y0) = (*effect, *params, *initial);
    let problem = OdeBuilder::<M>::new()
        .t0(0.0)
        .h0(settings.h0)
        .rtol(settings.rtol)
        .atol(vec![settings.atol; NSTATES])
        .rhs_implicit(
            move |c: &V, _p: &V, t: f64, dc: &mut V| {
                drift(c.as_slice(), t, &de, &x, dc.as_mut_slice())
            },
            move |c: &V, _p: &V, t: f64, v: &V, jv: &mut V| {
                jacobian_vector_product(c.as_slice(), t, v.as_slice(), &de, &x, jv.as_mut_slice())
            },
        )
        .init(move |_p: &V, _t: f64| V::from_column_slice(&y0))
        .build()
        .map_err(|e| solver_failure(horizon, e))?;

    let mut solver = problem
        .bdf::<NalgebraLU<f64>>()
        .map_err(|e| solver_failure(horizon, e))?;

    let mut steps = 0usize;
    for (index, &t) in times.iter().enumerate().skip(1) {
        match solver.set_stop_time(t) {
            Ok(_) => loop {
                match solver.step() {
                    Ok(OdeSolverStopReason::InternalTimestep) => {}
                    Ok(OdeSolverStopReason::TstopReached) => break,
                    Ok(reason) => {
                        return Err(solver_failure(
                            horizon,
                            format!("unexpected stop reason {:?}", reason),
                        ))
                    }
                    Err(err) => {
                        return Err(solver_failure(
                            horizon,
                            format!("{} (t = {:.4} weeks)", err, solver.state().t),
                        ))
                    }
                }
                steps += 1;
                if steps > settings.max_steps {
                    return Err(solver_failure(
                        horizon,
                        format!(
                            "exceeded {} internal steps before t = {} weeks",
                            settings.max_steps, t
                        ),
                    ));
                }
            },
            Err(DiffsolError::OdeSolverError(OdeSolverError::StopTimeAtCurrentTime)) => {}
            Err(err) => return Err(solver_failure(horizon, err)),
        }
        states
            .row_mut(index)
            .assign(&ArrayView1::from(solver.state().y.as_slice()));
    }

    Ok(Trajectory::new(times, states))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intervention::Intervention;
    use crate::model::INITIAL_STATE;

    #[test]
    fn output_grid_includes_both_endpoints() {
        let x = Parameters::uniform(1.0);
        let trajectory = integrate(
            &INITIAL_STATE,
            2.0,
            &DrugEffect::PLACEBO,
            &x,
            &SolverSettings::default(),
        )
        .unwrap();
        assert_eq!(trajectory.len(), 21);
        assert_eq!(trajectory.state(0).unwrap(), INITIAL_STATE);
        assert_eq!(trajectory.times()[20], 2.0);
    }

    #[test]
    fn first_step_continues_from_the_initial_state() {
        // Over one grid step each state moves by about h·f(y0), never jumps
        let x = Parameters::uniform(1.0);
        let trajectory = integrate(
            &INITIAL_STATE,
            0.1,
            &DrugEffect::EQUILIBRATION,
            &x,
            &SolverSettings::default(),
        )
        .unwrap();
        assert_eq!(trajectory.len(), 2);

        let mut rate = [0.0; NSTATES];
        drift(&INITIAL_STATE, 0.0, &DrugEffect::EQUILIBRATION, &x, &mut rate);
        let next = trajectory.state(1).unwrap();
        for k in 0..NSTATES {
            let moved = (next[k] - INITIAL_STATE[k]).abs();
            assert!(
                moved <= 1.5 * 0.1 * rate[k].abs() + 1e-3,
                "state {} moved {} in one step (rate {})",
                k,
                moved,
                rate[k]
            );
        }
    }

    #[test]
    fn linear_cytokine_relaxes_towards_production_balance() {
        // With unit constants IL17 obeys dIL17/dt = Th17 + 1 - IL17 and stays positive
        let x = Parameters::uniform(1.0);
        let trajectory = integrate(
            &INITIAL_STATE,
            5.0,
            &Intervention::Secukinumab.effect(),
            &x,
            &SolverSettings::default(),
        )
        .unwrap();
        assert!(trajectory.states().iter().all(|v| v.is_finite()));
        assert!(trajectory.column(8).iter().all(|&v| v > 0.0));
        let barrier = trajectory.column(0);
        assert!(barrier.iter().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn step_budget_exhaustion_is_an_integration_failure() {
        let x = Parameters::uniform(1.0);
        let settings = SolverSettings {
            max_steps: 3,
            ..SolverSettings::default()
        };
        let err = integrate(&INITIAL_STATE, 24.0, &DrugEffect::PLACEBO, &x, &settings)
            .unwrap_err();
        assert!(matches!(err, QspError::Integration { .. }));
    }
}
