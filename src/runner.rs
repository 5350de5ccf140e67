use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::{info, warn};

use crate::engine::Simulation;
use crate::error::HerdError;
use crate::log::parse_log_levels;
use crate::parameters::Parameters;
use crate::random::{SimulationRng, DEFAULT_SEED};
use crate::recorder::{EventRecorder, LogFileRecorder, NullRecorder};
use crate::report::{ReportOptions, SimulationReport, StepReportWriter};

/// Simulates the spread of a virus through a partly vaccinated population
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "herd_immunity", version)]
pub struct Args {
    /// Name of the virus
    #[arg(required_unless_present = "config")]
    pub virus_name: Option<String>,

    /// Probability that a contact with a susceptible person transmits the virus
    #[arg(required_unless_present = "config")]
    pub repro_rate: Option<f64>,

    /// Probability that an infected person dies instead of recovering
    #[arg(required_unless_present = "config")]
    pub mortality_rate: Option<f64>,

    /// Number of people in the population
    #[arg(required_unless_present = "config")]
    pub pop_size: Option<usize>,

    /// Fraction of the population vaccinated at the start
    #[arg(required_unless_present = "config")]
    pub vacc_percentage: Option<f64>,

    /// Number of people infected at the start
    pub initial_infected: Option<usize>,

    /// Random seed
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub random_seed: u64,

    /// Optional path to a JSON parameters file, used instead of the positional arguments
    #[arg(short, long, conflicts_with_all = [
        "virus_name", "repro_rate", "mortality_rate", "pop_size", "vacc_percentage", "initial_infected"
    ])]
    pub config: Option<PathBuf>,

    /// Directory for the event log and reports
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Replace output files that already exist
    #[arg(short, long)]
    pub force_overwrite: bool,

    /// Do not write the event log
    #[arg(long)]
    pub no_event_log: bool,

    /// Also write per-step counts to a CSV report
    #[arg(long)]
    pub step_report: bool,

    /// Log level, or comma separated `module=level` pairs (e.g. `herd_immunity::engine=trace,info`)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Collects the run parameters from the config file or the positional arguments.
    ///
    /// # Errors
    ///
    /// Returns a `HerdError` if the config file cannot be loaded, or
    /// `HerdError::ArgumentParseError` if a required positional argument is missing.
    pub fn parameters(&self) -> Result<Parameters, HerdError> {
        if let Some(config) = &self.config {
            return Parameters::from_json_file(config);
        }

        let missing =
            |name: &str| HerdError::ArgumentParseError(format!("missing argument <{name}>"));
        Ok(Parameters {
            virus_name: self.virus_name.clone().ok_or_else(|| missing("VIRUS_NAME"))?,
            repro_rate: self.repro_rate.ok_or_else(|| missing("REPRO_RATE"))?,
            mortality_rate: self.mortality_rate.ok_or_else(|| missing("MORTALITY_RATE"))?,
            population_size: self.pop_size.ok_or_else(|| missing("POP_SIZE"))?,
            vaccination_percentage: self
                .vacc_percentage
                .ok_or_else(|| missing("VACC_PERCENTAGE"))?,
            initial_infected: self.initial_infected.unwrap_or(1),
        })
    }
}

/// Parses `args` as a command line (the first item is the program name).
///
/// # Errors
///
/// Returns `HerdError::ArgumentParseError` if the arguments are malformed.
pub fn parse_args<I, T>(args: I) -> Result<Args, HerdError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Ok(Args::try_parse_from(args)?)
}

/// Runs a simulation with the command line arguments of this process, printing the final
/// report to standard output.
///
/// # Errors
///
/// Returns an error if the parameters are invalid or an output file cannot be written.
pub fn run_with_args() -> Result<SimulationReport, HerdError> {
    run(Args::parse())
}

/// Runs a simulation configured by `args`, printing the final report to standard output.
///
/// # Errors
///
/// Returns an error if the parameters are invalid or an output file cannot be written.
pub fn run(args: Args) -> Result<SimulationReport, HerdError> {
    if let Some(spec) = &args.log_level {
        parse_log_levels(spec)?.apply()?;
    }

    // Checked before any output file is created.
    let parameters = args.parameters()?;
    parameters.validate()?;
    info!("{parameters:?}");

    let mut report_options = ReportOptions::default();
    report_options
        .directory(args.output_dir.clone())
        .overwrite(args.force_overwrite);

    let recorder: Box<dyn EventRecorder> = if args.no_event_log {
        Box::new(NullRecorder)
    } else {
        let file_name = parameters.log_file_name();
        info!(
            "writing event log to {}",
            report_options.directory.join(&file_name).display()
        );
        Box::new(LogFileRecorder::from_file(
            report_options.create_file(&file_name)?,
        ))
    };

    let rng = SimulationRng::new(args.random_seed);
    let mut simulation = Simulation::from_validated(&parameters, rng, recorder)?;
    let report = simulation.run()?;

    if args.step_report {
        write_step_report(&simulation, &report_options, &parameters.log_file_name())?;
    }

    println!("{report}");
    Ok(report)
}

fn write_step_report<R: EventRecorder>(
    simulation: &Simulation<R>,
    report_options: &ReportOptions,
    log_file_name: &str,
) -> Result<(), HerdError> {
    let stem = Path::new(log_file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("simulation");
    let file_name = format!("{stem}_steps.csv");

    let mut writer = StepReportWriter::create(report_options, &file_name)?;
    for summary in simulation.history() {
        writer.send_report(summary)?;
    }
    writer.flush()?;
    if simulation.history().is_empty() {
        warn!("{file_name} is empty: the simulation ended before the first step");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn positional_arguments() {
        let args = parse_args(["herd_immunity", "Ebola", "0.25", "0.7", "100", "0.9", "10"]).unwrap();
        let parameters = args.parameters().unwrap();
        assert_eq!(
            parameters,
            Parameters {
                virus_name: "Ebola".to_string(),
                repro_rate: 0.25,
                mortality_rate: 0.7,
                population_size: 100,
                vaccination_percentage: 0.9,
                initial_infected: 10,
            }
        );
        assert_eq!(args.random_seed, DEFAULT_SEED);
        assert_eq!(args.output_dir, PathBuf::from("."));
    }

    #[test]
    fn initial_infected_defaults_to_one() {
        let args = parse_args(["herd_immunity", "Flu", "0.5", "0.1", "50", "0.2"]).unwrap();
        assert_eq!(args.parameters().unwrap().initial_infected, 1);
    }

    #[test]
    fn malformed_arguments() {
        let result = parse_args(["herd_immunity", "Flu", "high", "0.1", "50", "0.2"]);
        assert!(matches!(result, Err(HerdError::ArgumentParseError(_))));

        let result = parse_args(["herd_immunity", "Flu", "0.5"]);
        assert!(matches!(result, Err(HerdError::ArgumentParseError(_))));
    }

    #[test]
    fn config_conflicts_with_positionals() {
        let result = parse_args(["herd_immunity", "--config", "run.json", "Flu"]);
        assert!(matches!(result, Err(HerdError::ArgumentParseError(_))));
    }

    #[test]
    fn run_with_config_file() {
        let temp_dir = tempdir().unwrap();
        let config = temp_dir.path().join("run.json");
        fs::write(
            &config,
            r#"{"virus_name": "Measles", "repro_rate": 1.0, "mortality_rate": 0.0,
                "population_size": 10, "vaccination_percentage": 0.0}"#,
        )
        .unwrap();

        let args = parse_args([
            "herd_immunity".into(),
            "--config".into(),
            config.into_os_string(),
            "--output-dir".into(),
            temp_dir.path().as_os_str().to_owned(),
            "--step-report".into(),
        ])
        .unwrap();
        let report = run(args).unwrap();

        assert_eq!(report.total_dead, 0);
        assert_eq!(report.total_infected, 10);
        let log_path = temp_dir
            .path()
            .join("Measles_simulation_pop_10_vp_0.0_infected_1.txt");
        assert!(log_path.exists());
        assert!(temp_dir
            .path()
            .join("Measles_simulation_pop_10_vp_0.0_infected_1_steps.csv")
            .exists());
    }

    #[test]
    fn run_refuses_to_overwrite_event_log() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().to_str().unwrap();
        let command_line = [
            "herd_immunity",
            "Flu",
            "0.5",
            "0.1",
            "50",
            "0.2",
            "--output-dir",
            output_dir,
        ];

        assert!(run(parse_args(command_line).unwrap()).is_ok());
        assert!(matches!(
            run(parse_args(command_line).unwrap()),
            Err(HerdError::ReportError(_))
        ));

        let mut forced = parse_args(command_line).unwrap();
        forced.force_overwrite = true;
        assert!(run(forced).is_ok());
    }

    #[test]
    fn run_with_invalid_configuration() {
        let temp_dir = tempdir().unwrap();
        let args = parse_args([
            "herd_immunity",
            "Flu",
            "0.5",
            "0.1",
            "10",
            "0.5",
            "6",
            "--output-dir",
            temp_dir.path().to_str().unwrap(),
        ])
        .unwrap();

        assert!(matches!(
            run(args),
            Err(HerdError::InvalidConfiguration(_))
        ));
        // Nothing is written for a run that never starts.
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}
