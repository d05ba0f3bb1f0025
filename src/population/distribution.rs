use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};

use crate::{model::NPARAMS, QspError};

/// Log-normal population distribution of the 51 rate constants.
///
/// `mu[i]` and `sigma[i]` are the mean and standard deviation of `ln(k_i)`.
/// The sign of `sigma` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationDistribution {
    mu: Vec<f64>,
    sigma: Vec<f64>,
}

impl PopulationDistribution {
    pub fn new(mu: Vec<f64>, sigma: Vec<f64>) -> Result<Self, QspError> {
        check_vector("mu", &mu)?;
        check_vector("sigma", &sigma)?;
        Ok(Self { mu, sigma })
    }

    /// Reads `mu` and `sigma` from two files holding 51 numbers each,
    /// separated by commas and/or newlines.
    pub fn from_csv(
        mu_path: impl AsRef<Path>,
        sigma_path: impl AsRef<Path>,
    ) -> Result<Self, QspError> {
        let mu = read_values(mu_path.as_ref())?;
        let sigma = read_values(sigma_path.as_ref())?;
        Self::new(mu, sigma)
    }

    pub fn mu(&self) -> &[f64] {
        &self.mu
    }

    pub fn sigma(&self) -> &[f64] {
        &self.sigma
    }

    /// Median parameter values, `exp(mu)`.
    pub fn median(&self) -> Vec<f64> {
        self.mu.iter().map(|m| m.exp()).collect()
    }
}

fn check_vector(name: &str, values: &[f64]) -> Result<(), QspError> {
    if values.len() != NPARAMS {
        return Err(QspError::InvalidLength {
            name: name.to_string(),
            expected: NPARAMS,
            found: values.len(),
        });
    }
    if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(QspError::InvalidValue {
            name: name.to_string(),
            index,
            value,
        });
    }
    Ok(())
}

fn read_values(path: &Path) -> Result<Vec<f64>, QspError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;

    let mut values = Vec::with_capacity(NPARAMS);
    for record in reader.records() {
        let record = record?;
        for field in record.iter().filter(|f| !f.is_empty()) {
            let value = field.parse::<f64>().map_err(|_| QspError::Parse {
                source_name: path.display().to_string(),
                token: field.to_string(),
            })?;
            values.push(value);
        }
    }
    Ok(values)
}
