//! Run summaries and report files.
//!
//! [`SimulationReport`] is the terminal summary printed at the end of a run. [`StepSummary`] is
//! one row of the optional per-step counts report, written as a CSV with [`StepReportWriter`].
//! [`ReportOptions`] decides where output files go and whether existing files may be replaced.
use std::ffi::OsStr;
use std::fmt::{self, Display};
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::HerdError;

/// Counts for a single step, taken after new infections were activated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub step: usize,
    pub interactions: usize,
    pub new_infections: usize,
    pub deaths: usize,
    pub recoveries: usize,
    pub total_infected: usize,
    pub currently_infected: usize,
    pub total_dead: usize,
    pub vaccinated_or_immune: usize,
    pub vaccination_saves: usize,
}

/// The outcome of a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub steps: usize,
    pub population_size: usize,
    pub total_dead: usize,
    pub total_infected: usize,
    pub vaccination_saves: usize,
}

impl SimulationReport {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn death_percentage(&self) -> f64 {
        self.total_dead as f64 / self.population_size as f64 * 100.0
    }

    /// Share of the population infected at any point during the run.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn infection_percentage(&self) -> f64 {
        self.total_infected as f64 / self.population_size as f64 * 100.0
    }
}

// Percentages keep their decimal point: `0.0`, not `0`.
impl Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "The simulation has ended after {} turns.", self.steps)?;
        writeln!(f, "Total Death percentage: {:?}", self.death_percentage())?;
        writeln!(f, "Percent Infected: {:?}", self.infection_percentage())?;
        write!(f, "Vaccination saves: {}", self.vaccination_saves)
    }
}

/// Where report files are written and whether existing files may be replaced.
#[derive(Clone, Debug)]
pub struct ReportOptions {
    pub directory: PathBuf,
    pub overwrite: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            directory: PathBuf::from("."),
            overwrite: false,
        }
    }
}

impl ReportOptions {
    pub fn directory(&mut self, directory: PathBuf) -> &mut ReportOptions {
        self.directory = directory;
        self
    }

    pub fn overwrite(&mut self, overwrite: bool) -> &mut ReportOptions {
        self.overwrite = overwrite;
        self
    }

    /// Creates `file_name` in the output directory, creating the directory if it does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns `HerdError::ReportError` if the file exists and overwriting is off, or an
    /// `IoError` if the directory or file cannot be created.
    pub fn create_file(&self, file_name: &str) -> Result<File, HerdError> {
        let path = self.directory.join(file_name);
        generate_validate_filepath(&path, self.overwrite)
    }
}

// Checks that the path is usable. Creates the file and all parent directories if
// they do not exist.
fn generate_validate_filepath(path: &Path, overwrite: bool) -> Result<File, HerdError> {
    if path.exists() && !overwrite {
        return Err(HerdError::ReportError(format!(
            "{} already exists; use --force-overwrite to replace it",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    trace!("creating output file {}", path.display());
    let file = File::create(path)?;
    Ok(file)
}

/// Writes one CSV row per step.
pub struct StepReportWriter {
    writer: Writer<File>,
}

impl StepReportWriter {
    /// Creates the step report `file_name` according to `options`.
    ///
    /// # Errors
    ///
    /// Returns `HerdError::ReportError` if `file_name` is not a CSV file or already exists
    /// (and overwriting is off), or an `IoError` if it cannot be created.
    pub fn create(options: &ReportOptions, file_name: &str) -> Result<Self, HerdError> {
        match Path::new(file_name).extension().and_then(OsStr::to_str) {
            Some("csv") => {}
            _ => {
                return Err(HerdError::ReportError(
                    "Report output files must be CSVs at this time".to_string(),
                ))
            }
        }
        let file = options.create_file(file_name)?;
        Ok(StepReportWriter {
            writer: Writer::from_writer(file),
        })
    }

    /// # Errors
    ///
    /// Returns a `HerdError` if the row cannot be written.
    pub fn send_report(&mut self, summary: &StepSummary) -> Result<(), HerdError> {
        self.writer.serialize(summary)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a `HerdError` if the file cannot be flushed.
    pub fn flush(&mut self) -> Result<(), HerdError> {
        self.writer.flush()?;
        Ok(())
    }
}
