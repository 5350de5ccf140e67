//! An agent-based simulation of disease spread and herd immunity
//!
//! A fixed population is split into initially infected, vaccinated and susceptible people. Each
//! step, every infectious person meets a random set of living people and may pass the virus on to
//! the susceptible ones. Every active infection then ends in death or in recovery with immunity,
//! and the infections transmitted during the step become active. The run ends once the epidemic
//! has burned out or everyone is dead or immune.
//!
//! A simulation is assembled from a few modules:
//! * [`parameters`] describes a run and validates it.
//! * [`population_loader`] builds the initial population.
//! * [`engine`] advances the population step by step.
//! * [`recorder`] writes every contact and outcome to an event log.
//! * [`report`] summarizes a run for the terminal and as an optional CSV.
//! * [`runner`] ties these together behind a command line interface.
//!
//! ```rust
//! use herd_immunity::{NullRecorder, Parameters, Simulation, SimulationRng};
//!
//! let parameters = Parameters {
//!     virus_name: "Measles".to_string(),
//!     repro_rate: 0.9,
//!     mortality_rate: 0.01,
//!     population_size: 1000,
//!     vaccination_percentage: 0.5,
//!     initial_infected: 10,
//! };
//! let mut simulation =
//!     Simulation::new(&parameters, SimulationRng::new(42), NullRecorder).unwrap();
//! let report = simulation.run().unwrap();
//! assert!(report.total_infected >= 10);
//! ```
pub mod engine;
pub mod error;
pub mod hashing;
pub mod log;
pub mod parameters;
pub mod pathogen;
pub mod people;
pub mod population_loader;
pub mod random;
pub mod recorder;
pub mod report;
pub mod runner;

pub use engine::{Simulation, SimulationState, CONTACTS_PER_STEP};
pub use error::HerdError;
pub use parameters::Parameters;
pub use pathogen::{Pathogen, PathogenId};
pub use people::{Individual, PersonId, Population};
pub use random::{SimulationRng, DEFAULT_SEED};
pub use recorder::{
    EventRecorder, InteractionOutcome, LogFileRecorder, MemoryRecorder, NullRecorder,
};
pub use report::{ReportOptions, SimulationReport, StepSummary};
pub use runner::run_with_args;

// Re-exported so downstream code can name the RNG types without its own dependency.
pub use rand;
