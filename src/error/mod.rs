use thiserror::Error;

#[derive(Error, Debug)]
pub enum QspError {
    #[error("Expected {expected} values for {name}, found {found}")]
    InvalidLength {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Invalid value for {name}[{index}]: {value}")]
    InvalidValue {
        name: String,
        index: usize,
        value: f64,
    },
    #[error("The number of virtual patients must be positive")]
    InvalidPatientCount,
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Error reading configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse '{token}' in {source_name} as a number")]
    Parse { source_name: String, token: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ODE solver failed during {phase}: {message}")]
    Integration { phase: String, message: String },
    #[error("All {requested} virtual patients were excluded ({excluded} exclusions), no population statistics can be computed")]
    DegeneratePopulation { requested: usize, excluded: usize },
}

impl QspError {
    pub(crate) fn integration(phase: impl Into<String>, message: impl Into<String>) -> Self {
        QspError::Integration {
            phase: phase.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors that invalidate the whole run before any simulation starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            QspError::InvalidLength { .. }
                | QspError::InvalidValue { .. }
                | QspError::InvalidPatientCount
                | QspError::InvalidSettings(_)
                | QspError::Config(_)
                | QspError::Csv(_)
                | QspError::Io(_)
                | QspError::Parse { .. }
        )
    }
}
