//! Diagnostic logging, not to be confused with the event log, which records what happened to the
//! population during a run (see [`crate::recorder`]).
//!
//! The engine emits messages through the `log` macros: run start and end at `info`, a summary of
//! each step at `debug`, and every contact and outcome at `trace`. Messages go to standard error
//! so standard output only carries the final report.
//!
//! Logging is off until levels are applied, usually from the `--log-level` option. A level spec is
//! a comma separated list of global levels and `module=level` pairs:
//!
//! ```rust
//! use herd_immunity::log::parse_log_levels;
//!
//! // `warn` everywhere, every contact the engine resolves.
//! let levels = parse_log_levels("warn,herd_immunity::engine=trace").unwrap();
//! levels.apply().unwrap();
//! ```
mod standard_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, MutexGuard};

use crate::error::HerdError;
use crate::hashing::HashMap;
use log4rs::Handle;

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// The levels currently installed in the global logger. Only one instance exists, behind
/// `LOG_CONFIGURATION`.
#[derive(Debug)]
struct LogConfiguration {
    /// Level for targets without a module level. `Off` disables logging.
    global_level: LevelFilter,
    module_levels: HashMap<String, LevelFilter>,
    /// Present once `log4rs` is installed as the global logger.
    handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        LogConfiguration {
            global_level: LevelFilter::Off,
            module_levels: HashMap::default(),
            handle: None,
        }
    }
}

impl LogConfiguration {
    /// Merges `levels` into the configuration and reinstalls the logger if anything changed.
    fn update(&mut self, levels: &LogLevels) -> Result<(), HerdError> {
        let mut changed = false;
        if let Some(level) = levels.global {
            changed |= self.global_level != level;
            self.global_level = level;
        }
        for (module, level) in &levels.modules {
            changed |= self.module_levels.insert(module.clone(), *level) != Some(*level);
        }
        if changed {
            self.install()?;
        }
        Ok(())
    }
}

/// A parsed `--log-level` option.
#[derive(Debug, Default, PartialEq)]
pub struct LogLevels {
    pub global: Option<LevelFilter>,
    pub modules: Vec<(String, LevelFilter)>,
}

impl LogLevels {
    /// Installs these levels in the global logger. Levels for modules not named here, and the
    /// global level if none is given, stay as they were.
    ///
    /// # Errors
    ///
    /// Returns `HerdError::InvalidConfiguration` if `log4rs` rejects the resulting configuration.
    pub fn apply(&self) -> Result<(), HerdError> {
        get_log_configuration().update(self)
    }
}

/// Parses a log level spec: a comma separated list of global levels (`info`) and `module=level`
/// pairs (`herd_immunity::engine=trace`). Level names are case insensitive, and `off` turns
/// logging off.
///
/// # Errors
///
/// Returns `HerdError::ArgumentParseError` if a level name is not recognized.
pub fn parse_log_levels(spec: &str) -> Result<LogLevels, HerdError> {
    let parse_level = |level: &str| {
        let level = level.trim();
        LevelFilter::from_str(level)
            .map_err(|_| HerdError::ArgumentParseError(format!("unrecognized log level \"{level}\"")))
    };

    let mut levels = LogLevels::default();
    for part in spec.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        match part.split_once('=') {
            Some((module, level)) => {
                levels
                    .modules
                    .push((module.trim().to_string(), parse_level(level)?));
            }
            None => levels.global = Some(parse_level(part)?),
        }
    }
    Ok(levels)
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::{get_log_configuration, parse_log_levels, LogLevels};
    use log::{error, trace, LevelFilter};
    use std::sync::{LazyLock, Mutex};

    // The logger is global; these tests must not interleave.
    static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    #[test]
    fn apply_global_level() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        parse_log_levels("error").unwrap().apply().unwrap();
        assert_eq!(get_log_configuration().global_level, LevelFilter::Error);
        error!("apply_global_level: global set to error");
        trace!("apply_global_level: NOT EMITTED");

        parse_log_levels("off").unwrap().apply().unwrap();
        assert_eq!(get_log_configuration().global_level, LevelFilter::Off);
    }

    #[test]
    fn apply_module_levels() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        let levels = parse_log_levels("herd_immunity::engine=trace,herd_immunity::runner=debug")
            .unwrap();
        levels.apply().unwrap();
        {
            let config = get_log_configuration();
            assert_eq!(
                config.module_levels.get("herd_immunity::engine"),
                Some(&LevelFilter::Trace)
            );
            assert_eq!(
                config.module_levels.get("herd_immunity::runner"),
                Some(&LevelFilter::Debug)
            );
        }

        // A later spec only touches the modules it names.
        parse_log_levels("herd_immunity::engine=off")
            .unwrap()
            .apply()
            .unwrap();
        let config = get_log_configuration();
        assert_eq!(
            config.module_levels.get("herd_immunity::engine"),
            Some(&LevelFilter::Off)
        );
        assert_eq!(
            config.module_levels.get("herd_immunity::runner"),
            Some(&LevelFilter::Debug)
        );
    }

    #[test]
    fn parse_global_level() {
        assert_eq!(
            parse_log_levels("info").unwrap(),
            LogLevels {
                global: Some(LevelFilter::Info),
                modules: vec![],
            }
        );
        assert_eq!(
            parse_log_levels("TRACE").unwrap().global,
            Some(LevelFilter::Trace)
        );
    }

    #[test]
    fn parse_module_levels() {
        let levels = parse_log_levels("herd_immunity::engine=trace, warn").unwrap();
        assert_eq!(levels.global, Some(LevelFilter::Warn));
        assert_eq!(
            levels.modules,
            vec![("herd_immunity::engine".to_string(), LevelFilter::Trace)]
        );
    }

    #[test]
    fn parse_bad_level() {
        assert!(parse_log_levels("loud").is_err());
        assert!(parse_log_levels("herd_immunity=loud").is_err());
    }
}
