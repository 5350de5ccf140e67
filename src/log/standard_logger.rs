use std::iter;

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use super::LogConfiguration;
use crate::error::HerdError;

// ISO 8601 timestamp, color coded level, target
const LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";
const APPENDER: &str = "stderr";

impl LogConfiguration {
    /// Points the global logger at this configuration, installing `log4rs` on first use.
    pub(super) fn install(&mut self) -> Result<(), HerdError> {
        let config = self.build_config()?;
        if let Some(handle) = &self.handle {
            handle.set_config(config);
            return Ok(());
        }
        match log4rs::init_config(config) {
            Ok(handle) => self.handle = Some(handle),
            // Some other logger got there first; keep its level filter in step.
            Err(_) => log::set_max_level(self.max_level()),
        }
        Ok(())
    }

    fn build_config(&self) -> Result<Config, HerdError> {
        let stderr = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        let loggers = self
            .module_levels
            .iter()
            .map(|(module, level)| Logger::builder().build(module.clone(), *level));

        Config::builder()
            .appender(Appender::builder().build(APPENDER, Box::new(stderr)))
            .loggers(loggers)
            .build(Root::builder().appender(APPENDER).build(self.global_level))
            .map_err(|errors| HerdError::InvalidConfiguration(format!("logging: {errors}")))
    }

    fn max_level(&self) -> LevelFilter {
        self.module_levels
            .values()
            .copied()
            .chain(iter::once(self.global_level))
            .max()
            .unwrap_or(self.global_level)
    }
}
