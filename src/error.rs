use std::fmt::{self, Display};
use std::io;

use crate::people::PersonId;

/// Provides `HerdError` and maps other errors to
/// convert to a `HerdError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum HerdError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    /// Population size, rates, or initial counts that cannot describe a run.
    InvalidConfiguration(String),
    /// Malformed command line input.
    ArgumentParseError(String),
    /// Contact sampling for `initiator` gave up after `attempts` draws.
    SamplingExhausted {
        initiator: PersonId,
        attempts: usize,
    },
    ReportError(String),
}

impl From<io::Error> for HerdError {
    fn from(error: io::Error) -> Self {
        HerdError::IoError(error)
    }
}

impl From<serde_json::Error> for HerdError {
    fn from(error: serde_json::Error) -> Self {
        HerdError::JsonError(error)
    }
}

impl From<csv::Error> for HerdError {
    fn from(error: csv::Error) -> Self {
        HerdError::CsvError(error)
    }
}

impl From<clap::Error> for HerdError {
    fn from(error: clap::Error) -> Self {
        HerdError::ArgumentParseError(error.to_string())
    }
}

impl std::error::Error for HerdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HerdError::IoError(error) => Some(error),
            HerdError::JsonError(error) => Some(error),
            HerdError::CsvError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for HerdError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HerdError::IoError(error) => write!(f, "I/O error: {error}"),
            HerdError::JsonError(error) => write!(f, "JSON error: {error}"),
            HerdError::CsvError(error) => write!(f, "CSV error: {error}"),
            HerdError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            HerdError::ArgumentParseError(msg) => write!(f, "invalid arguments: {msg}"),
            HerdError::SamplingExhausted {
                initiator,
                attempts,
            } => write!(
                f,
                "contact sampling for {initiator:?} exhausted after {attempts} draws"
            ),
            HerdError::ReportError(msg) => write!(f, "report error: {msg}"),
        }
    }
}
