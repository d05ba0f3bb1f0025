use config::Config as eConfig;
use serde::{Deserialize, Serialize};

use crate::QspError;

/// Loosest relative tolerance that still reaches the reference steady states.
pub const MAX_RTOL: f64 = 1e-8;
/// Loosest absolute tolerance that still reaches the reference steady states.
pub const MAX_ATOL: f64 = 1e-6;

/// Run configuration.
///
/// Every section and field has a default, so a settings file only needs to
/// list what it changes:
///
/// ```toml
/// [simulation]
/// n_patients = 500
/// seed = 42
///
/// [log]
/// level = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub solver: SolverSettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Number of virtual patients to sample
    #[serde(default = "default_patients")]
    pub n_patients: usize,
    /// Seed of the random source used to sample the cohort
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Simulate patients on the rayon thread pool
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Show a progress bar while patients are simulated
    #[serde(default = "default_false")]
    pub progress: bool,
}

/// Tolerances and step control of the BDF solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    #[serde(default = "default_atol")]
    pub atol: f64,
    /// Initial step size, in weeks
    #[serde(default = "default_h0")]
    pub h0: f64,
    /// Internal step budget of a single integrator run
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `info` or `adqsp=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file, written in addition to stdout
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            n_patients: default_patients(),
            seed: default_seed(),
            parallel: default_true(),
            progress: default_false(),
        }
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            rtol: default_rtol(),
            atol: default_atol(),
            h0: default_h0(),
            max_steps: default_max_steps(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a TOML settings file. Values can be overridden with environment
    /// variables prefixed by `ADQSP`, with `__` separating nested keys.
    pub fn from_file(path: &str) -> Result<Self, QspError> {
        let parsed = eConfig::builder()
            .add_source(config::File::with_name(path).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix("ADQSP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = parsed.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_patients(mut self, n_patients: usize) -> Self {
        self.simulation.n_patients = n_patients;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.simulation.seed = seed;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.simulation.parallel = false;
        self
    }

    pub fn with_progress(mut self) -> Self {
        self.simulation.progress = true;
        self
    }

    pub fn validate(&self) -> Result<(), QspError> {
        if self.simulation.n_patients == 0 {
            return Err(QspError::InvalidPatientCount);
        }
        self.solver.validate()
    }
}

impl SolverSettings {
    pub fn validate(&self) -> Result<(), QspError> {
        if !(self.rtol > 0.0 && self.rtol <= MAX_RTOL) {
            return Err(QspError::InvalidSettings(format!(
                "rtol must be in (0, {MAX_RTOL:e}], got {}",
                self.rtol
            )));
        }
        if !(self.atol > 0.0 && self.atol <= MAX_ATOL) {
            return Err(QspError::InvalidSettings(format!(
                "atol must be in (0, {MAX_ATOL:e}], got {}",
                self.atol
            )));
        }
        if !(self.h0 > 0.0 && self.h0.is_finite()) {
            return Err(QspError::InvalidSettings(format!(
                "h0 must be positive, got {}",
                self.h0
            )));
        }
        if self.max_steps == 0 {
            return Err(QspError::InvalidSettings(
                "max_steps must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// *********************************
// Default values for deserializing
// *********************************
fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_patients() -> usize {
    1000
}

fn default_seed() -> u64 {
    347
}

fn default_rtol() -> f64 {
    MAX_RTOL
}

fn default_atol() -> f64 {
    MAX_ATOL
}

fn default_h0() -> f64 {
    1e-3
}

fn default_max_steps() -> usize {
    1_000_000
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::new();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.simulation.n_patients, 1000);
        assert_eq!(settings.solver.rtol, 1e-8);
        assert_eq!(settings.solver.atol, 1e-6);
        assert_eq!(settings.log.level, "info");
    }

    #[test]
    fn zero_patients_is_rejected() {
        let err = Settings::new().with_patients(0).validate().unwrap_err();
        assert!(matches!(err, QspError::InvalidPatientCount));
    }

    #[test]
    fn loose_tolerances_are_rejected() {
        let mut settings = Settings::new();
        settings.solver.rtol = 1e-4;
        assert!(matches!(
            settings.validate(),
            Err(QspError::InvalidSettings(_))
        ));

        let mut settings = Settings::new();
        settings.solver.atol = 1e-3;
        assert!(settings.validate().is_err());

        let mut settings = Settings::new();
        settings.solver.rtol = 1e-10;
        settings.solver.atol = 1e-9;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[simulation]\nn_patients = 12\nseed = 5\n\n[log]\nlevel = \"debug\"").unwrap();
        let settings = Settings::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.simulation.n_patients, 12);
        assert_eq!(settings.simulation.seed, 5);
        assert!(settings.simulation.parallel);
        assert_eq!(settings.solver, SolverSettings::default());
        assert_eq!(settings.log.level, "debug");
    }

    #[test]
    fn file_with_loose_tolerance_fails_fast() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[solver]\nrtol = 0.001").unwrap();
        assert!(Settings::from_file(file.path().to_str().unwrap()).is_err());
    }
}
