use std::path::Path;

use csv::WriterBuilder;

use crate::{
    intervention::Intervention,
    model::baseline_factor_names,
    simulator::{time_grid, TREATMENT_WEEKS},
    QspError,
};

use super::{ExclusionReason, PopulationResult};

impl PopulationResult {
    /// Writes the population outputs to `dir`, creating it if needed:
    ///
    /// - `baseline.csv`: one row per baseline factor with its mean and percent CV
    /// - `improvement.csv`: mean percent EASI improvement, one column per arm
    /// - `responders.csv`: EASI-75 responder rate, one column per arm
    /// - `exclusions.csv`: one row per excluded patient
    pub fn write_csv(&self, dir: impl AsRef<Path>) -> Result<(), QspError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        self.write_baseline(&dir.join("baseline.csv"))?;
        self.write_time_courses(&dir.join("improvement.csv"), self.mean_improvement())?;
        self.write_time_courses(&dir.join("responders.csv"), self.responder_rate())?;
        self.write_exclusions(&dir.join("exclusions.csv"))?;

        tracing::info!("Population outputs written to {}", dir.display());
        Ok(())
    }

    /// Serializes the whole result, per-patient improvements included.
    pub fn to_json(&self) -> Result<String, QspError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn write_baseline(&self, path: &Path) -> Result<(), QspError> {
        let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
        writer.write_record(["factor", "mean", "cv"])?;
        for ((name, mean), cv) in baseline_factor_names()
            .iter()
            .zip(self.baseline_mean())
            .zip(self.baseline_cv())
        {
            writer.write_record([name.to_string(), mean.to_string(), cv.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_time_courses(
        &self,
        path: &Path,
        values: &ndarray::Array2<f64>,
    ) -> Result<(), QspError> {
        let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;

        let mut header = vec!["time".to_string()];
        header.extend(Intervention::ALL.iter().map(|i| i.name().to_string()));
        writer.write_record(&header)?;

        for (time, row) in time_grid(TREATMENT_WEEKS).iter().zip(values.rows()) {
            let mut record = vec![format!("{:.1}", time)];
            record.extend(row.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_exclusions(&self, path: &Path) -> Result<(), QspError> {
        let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
        writer.write_record(["patient", "reason", "arm", "time", "score", "message"])?;
        for exclusion in self.exclusions() {
            let patient = exclusion.patient.to_string();
            let record = match &exclusion.reason {
                ExclusionReason::IntegrationFailure { message } => [
                    patient,
                    "integration".to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    message.clone(),
                ],
                ExclusionReason::ScoreCeiling {
                    intervention,
                    time,
                    score,
                } => [
                    patient,
                    "ceiling".to_string(),
                    intervention.name().to_string(),
                    format!("{:.1}", time),
                    score.to_string(),
                    String::new(),
                ],
            };
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
