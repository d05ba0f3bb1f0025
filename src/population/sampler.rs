use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::{
    model::{Parameters, NPARAMS},
    QspError,
};

use super::PopulationDistribution;

/// Draws `n` independent virtual patients, `k_i = exp(mu_i + |sigma_i|·z_i)`
/// with `z_i` standard normal.
///
/// Patients are drawn one after another, 51 values each, so a seeded `rng`
/// always yields the same cohort.
pub fn sample_population<R: Rng + ?Sized>(
    distribution: &PopulationDistribution,
    n: usize,
    rng: &mut R,
) -> Result<Vec<Parameters>, QspError> {
    if n == 0 {
        return Err(QspError::InvalidPatientCount);
    }

    let mut cohort = Vec::with_capacity(n);
    let mut values = [0.0; NPARAMS];
    for _ in 0..n {
        for (value, (&mu, &sigma)) in values
            .iter_mut()
            .zip(distribution.mu().iter().zip(distribution.sigma()))
        {
            let z: f64 = StandardNormal.sample(&mut *rng);
            *value = (mu + sigma.abs() * z).exp();
        }
        cohort.push(Parameters::new(&values)?);
    }
    Ok(cohort)
}
