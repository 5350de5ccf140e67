//! Event recording.
//!
//! The engine reports everything that happens during a run to an [`EventRecorder`]: one metadata
//! record when the population is created, one record per contact, and one record per infection
//! that ends in death or recovery. Recorders only receive events; nothing they do feeds back into
//! the simulation.
use std::fs::File;
use std::io::{self, BufWriter, Write};

use csv::{Writer, WriterBuilder};
use serde::Serialize;

use crate::error::HerdError;
use crate::people::{Individual, PersonId};

/// The configuration of a run, written once before the first step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunMetadata {
    pub population_size: usize,
    pub vaccination_percentage: f64,
    pub virus_name: String,
    pub mortality_rate: f64,
    pub transmission_rate: f64,
}

/// How a single contact between an infectious initiator and a target was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum InteractionOutcome {
    /// The target was immune, so nothing was transmitted.
    BlockedByVaccination,
    /// The target was already infectious.
    AlreadyInfected,
    /// The target was susceptible and caught the infection.
    Transmitted,
    /// The target was susceptible and resisted the infection.
    NotTransmitted,
}

impl InteractionOutcome {
    #[must_use]
    pub fn was_already_infected(self) -> bool {
        self == InteractionOutcome::AlreadyInfected
    }

    #[must_use]
    pub fn was_blocked_by_vaccination(self) -> bool {
        self == InteractionOutcome::BlockedByVaccination
    }

    #[must_use]
    pub fn transmission_occurred(self) -> bool {
        self == InteractionOutcome::Transmitted
    }
}

pub trait EventRecorder {
    /// Records the configuration of the run.
    ///
    /// # Errors
    ///
    /// Returns a `HerdError` if the record cannot be written.
    fn write_metadata(&mut self, metadata: &RunMetadata) -> Result<(), HerdError>;

    /// Records one resolved contact.
    ///
    /// # Errors
    ///
    /// Returns a `HerdError` if the record cannot be written.
    fn log_interaction(
        &mut self,
        initiator: &Individual,
        target: &Individual,
        outcome: InteractionOutcome,
    ) -> Result<(), HerdError>;

    /// Records the end of an infection, either by death or by recovery.
    ///
    /// # Errors
    ///
    /// Returns a `HerdError` if the record cannot be written.
    fn log_infection_outcome(
        &mut self,
        individual: &Individual,
        died: bool,
    ) -> Result<(), HerdError>;

    /// Called before the first event of each step.
    fn start_step(&mut self, _step: usize) {}

    /// Pushes any buffered records to their destination.
    ///
    /// # Errors
    ///
    /// Returns a `HerdError` if the destination cannot be written.
    fn flush(&mut self) -> Result<(), HerdError> {
        Ok(())
    }
}

impl<R: EventRecorder + ?Sized> EventRecorder for Box<R> {
    fn write_metadata(&mut self, metadata: &RunMetadata) -> Result<(), HerdError> {
        (**self).write_metadata(metadata)
    }

    fn log_interaction(
        &mut self,
        initiator: &Individual,
        target: &Individual,
        outcome: InteractionOutcome,
    ) -> Result<(), HerdError> {
        (**self).log_interaction(initiator, target, outcome)
    }

    fn log_infection_outcome(
        &mut self,
        individual: &Individual,
        died: bool,
    ) -> Result<(), HerdError> {
        (**self).log_infection_outcome(individual, died)
    }

    fn start_step(&mut self, step: usize) {
        (**self).start_step(step);
    }

    fn flush(&mut self) -> Result<(), HerdError> {
        (**self).flush()
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRecorder;

impl EventRecorder for NullRecorder {
    fn write_metadata(&mut self, _metadata: &RunMetadata) -> Result<(), HerdError> {
        Ok(())
    }

    fn log_interaction(
        &mut self,
        _initiator: &Individual,
        _target: &Individual,
        _outcome: InteractionOutcome,
    ) -> Result<(), HerdError> {
        Ok(())
    }

    fn log_infection_outcome(
        &mut self,
        _individual: &Individual,
        _died: bool,
    ) -> Result<(), HerdError> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    Metadata(RunMetadata),
    Interaction {
        step: usize,
        initiator: PersonId,
        target: PersonId,
        outcome: InteractionOutcome,
    },
    InfectionOutcome {
        step: usize,
        person: PersonId,
        died: bool,
    },
}

/// Keeps every event in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryRecorder {
    step: usize,
    events: Vec<RecordedEvent>,
}

impl MemoryRecorder {
    #[must_use]
    pub fn new() -> Self {
        MemoryRecorder::default()
    }

    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    pub fn interactions(&self) -> impl Iterator<Item = &RecordedEvent> {
        self.events
            .iter()
            .filter(|event| matches!(event, RecordedEvent::Interaction { .. }))
    }

    pub fn infection_outcomes(&self) -> impl Iterator<Item = &RecordedEvent> {
        self.events
            .iter()
            .filter(|event| matches!(event, RecordedEvent::InfectionOutcome { .. }))
    }
}

impl EventRecorder for MemoryRecorder {
    fn write_metadata(&mut self, metadata: &RunMetadata) -> Result<(), HerdError> {
        self.events.push(RecordedEvent::Metadata(metadata.clone()));
        Ok(())
    }

    fn log_interaction(
        &mut self,
        initiator: &Individual,
        target: &Individual,
        outcome: InteractionOutcome,
    ) -> Result<(), HerdError> {
        self.events.push(RecordedEvent::Interaction {
            step: self.step,
            initiator: initiator.id(),
            target: target.id(),
            outcome,
        });
        Ok(())
    }

    fn log_infection_outcome(
        &mut self,
        individual: &Individual,
        died: bool,
    ) -> Result<(), HerdError> {
        self.events.push(RecordedEvent::InfectionOutcome {
            step: self.step,
            person: individual.id(),
            died,
        });
        Ok(())
    }

    fn start_step(&mut self, step: usize) {
        self.step = step;
    }
}

#[derive(Serialize)]
struct MetadataRow<'a> {
    kind: &'static str,
    population_size: usize,
    vaccination_percentage: f64,
    virus_name: &'a str,
    mortality_rate: f64,
    transmission_rate: f64,
}

#[derive(Serialize)]
struct InteractionRow {
    kind: &'static str,
    step: usize,
    initiator: PersonId,
    target: PersonId,
    already_infected: bool,
    blocked_by_vaccination: bool,
    transmitted: bool,
}

#[derive(Serialize)]
struct InfectionOutcomeRow {
    kind: &'static str,
    step: usize,
    person: PersonId,
    died: bool,
}

/// Writes events as tab-separated rows: the metadata row first, then one row per event, each
/// starting with its kind.
pub struct LogFileRecorder<W: Write> {
    step: usize,
    writer: Writer<W>,
}

impl LogFileRecorder<BufWriter<File>> {
    #[must_use]
    pub fn from_file(file: File) -> Self {
        LogFileRecorder::new(BufWriter::new(file))
    }
}

impl<W: Write> LogFileRecorder<W> {
    pub fn new(inner: W) -> Self {
        let writer = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_writer(inner);
        LogFileRecorder { step: 0, writer }
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns a `HerdError` if the buffered rows cannot be flushed.
    pub fn into_inner(self) -> Result<W, HerdError> {
        self.writer
            .into_inner()
            .map_err(|error| HerdError::IoError(io::Error::other(error.to_string())))
    }
}

impl<W: Write> EventRecorder for LogFileRecorder<W> {
    fn write_metadata(&mut self, metadata: &RunMetadata) -> Result<(), HerdError> {
        self.writer.serialize(MetadataRow {
            kind: "metadata",
            population_size: metadata.population_size,
            vaccination_percentage: metadata.vaccination_percentage,
            virus_name: &metadata.virus_name,
            mortality_rate: metadata.mortality_rate,
            transmission_rate: metadata.transmission_rate,
        })?;
        Ok(())
    }

    fn log_interaction(
        &mut self,
        initiator: &Individual,
        target: &Individual,
        outcome: InteractionOutcome,
    ) -> Result<(), HerdError> {
        self.writer.serialize(InteractionRow {
            kind: "interaction",
            step: self.step,
            initiator: initiator.id(),
            target: target.id(),
            already_infected: outcome.was_already_infected(),
            blocked_by_vaccination: outcome.was_blocked_by_vaccination(),
            transmitted: outcome.transmission_occurred(),
        })?;
        Ok(())
    }

    fn log_infection_outcome(
        &mut self,
        individual: &Individual,
        died: bool,
    ) -> Result<(), HerdError> {
        self.writer.serialize(InfectionOutcomeRow {
            kind: "outcome",
            step: self.step,
            person: individual.id(),
            died,
        })?;
        Ok(())
    }

    fn start_step(&mut self, step: usize) {
        self.step = step;
    }

    fn flush(&mut self) -> Result<(), HerdError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathogen::PathogenId;

    fn metadata() -> RunMetadata {
        RunMetadata {
            population_size: 10,
            vaccination_percentage: 0.5,
            virus_name: "Flu".to_string(),
            mortality_rate: 0.1,
            transmission_rate: 0.2,
        }
    }

    #[test]
    fn outcome_flags() {
        use InteractionOutcome::*;
        assert!(AlreadyInfected.was_already_infected());
        assert!(BlockedByVaccination.was_blocked_by_vaccination());
        assert!(Transmitted.transmission_occurred());
        for outcome in [BlockedByVaccination, AlreadyInfected, NotTransmitted] {
            assert!(!outcome.transmission_occurred());
        }
        assert!(!NotTransmitted.was_already_infected());
        assert!(!NotTransmitted.was_blocked_by_vaccination());
    }

    #[test]
    fn memory_recorder_tags_steps() {
        let initiator = Individual::infected(PersonId(0), PathogenId(0));
        let target = Individual::susceptible(PersonId(1));

        let mut recorder = MemoryRecorder::new();
        recorder.write_metadata(&metadata()).unwrap();
        recorder.start_step(3);
        recorder
            .log_interaction(&initiator, &target, InteractionOutcome::Transmitted)
            .unwrap();
        recorder.log_infection_outcome(&initiator, true).unwrap();

        assert_eq!(recorder.events().len(), 3);
        assert_eq!(recorder.events()[0], RecordedEvent::Metadata(metadata()));
        assert_eq!(
            recorder.interactions().next(),
            Some(&RecordedEvent::Interaction {
                step: 3,
                initiator: PersonId(0),
                target: PersonId(1),
                outcome: InteractionOutcome::Transmitted,
            })
        );
        assert_eq!(
            recorder.infection_outcomes().next(),
            Some(&RecordedEvent::InfectionOutcome {
                step: 3,
                person: PersonId(0),
                died: true,
            })
        );
    }

    #[test]
    fn log_file_rows() {
        let initiator = Individual::infected(PersonId(0), PathogenId(0));
        let target = Individual::vaccinated(PersonId(4));

        let mut recorder = LogFileRecorder::new(Vec::new());
        recorder.write_metadata(&metadata()).unwrap();
        recorder.start_step(1);
        recorder
            .log_interaction(&initiator, &target, InteractionOutcome::BlockedByVaccination)
            .unwrap();
        recorder.log_infection_outcome(&initiator, false).unwrap();

        let output = String::from_utf8(recorder.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "metadata\t10\t0.5\tFlu\t0.1\t0.2",
                "interaction\t1\t0\t4\tfalse\ttrue\tfalse",
                "outcome\t1\t0\tfalse",
            ]
        );
    }

    #[test]
    fn boxed_recorders_forward() {
        let mut recorder: Box<dyn EventRecorder> = Box::new(NullRecorder);
        assert!(recorder.write_metadata(&metadata()).is_ok());
        assert!(recorder.flush().is_ok());
    }
}
