//! Run configuration.
//!
//! Parameters come either from the positional command line arguments or from a JSON file passed
//! with `--config`. Either way they are validated once, before the population is built.
use std::fs;
use std::path::Path;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::HerdError;
use crate::pathogen::{check_probability, Pathogen};

fn default_initial_infected() -> usize {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub virus_name: String,
    /// Used directly as the per-contact transmission probability.
    pub repro_rate: f64,
    pub mortality_rate: f64,
    pub population_size: usize,
    /// Fraction of the population vaccinated at the start, in [0, 1].
    pub vaccination_percentage: f64,
    #[serde(default = "default_initial_infected")]
    pub initial_infected: usize,
}

impl Parameters {
    /// Loads parameters from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a `HerdError` if the file cannot be read or does not describe a `Parameters`
    /// value. The result is not validated.
    pub fn from_json_file(path: &Path) -> Result<Self, HerdError> {
        trace!("loading parameters from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let parameters = serde_json::from_str(&contents)?;
        Ok(parameters)
    }

    /// Number of people vaccinated at creation, rounded down.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn vaccinated_count(&self) -> usize {
        (self.vaccination_percentage * self.population_size as f64).floor() as usize
    }

    /// Checks that these parameters describe a population the simulation can run on.
    ///
    /// # Errors
    ///
    /// Returns `HerdError::InvalidConfiguration` if the population is empty, any rate lies
    /// outside [0, 1], or the initially infected and vaccinated groups do not fit in the
    /// population.
    pub fn validate(&self) -> Result<(), HerdError> {
        if self.population_size == 0 {
            return Err(HerdError::InvalidConfiguration(
                "population size must be positive".to_string(),
            ));
        }
        check_probability("transmission rate", self.repro_rate)?;
        check_probability("mortality rate", self.mortality_rate)?;
        check_probability("vaccination percentage", self.vaccination_percentage)?;

        let vaccinated = self.vaccinated_count();
        if self.initial_infected + vaccinated > self.population_size {
            return Err(HerdError::InvalidConfiguration(format!(
                "{} initially infected and {} vaccinated people do not fit in a population of {}",
                self.initial_infected, vaccinated, self.population_size
            )));
        }
        Ok(())
    }

    /// Builds the pathogen described by these parameters.
    ///
    /// # Errors
    ///
    /// Returns `HerdError::InvalidConfiguration` if a rate is not a probability.
    pub fn pathogen(&self) -> Result<Pathogen, HerdError> {
        Pathogen::new(
            self.virus_name.clone(),
            self.repro_rate,
            self.mortality_rate,
        )
    }

    /// Name of the event log file for this run. The vaccination percentage always keeps its
    /// decimal point (`vp_0.0`, never `vp_0`).
    #[must_use]
    pub fn log_file_name(&self) -> String {
        format!(
            "{}_simulation_pop_{}_vp_{:?}_infected_{}.txt",
            self.virus_name, self.population_size, self.vaccination_percentage, self.initial_infected
        )
    }
}
