//! The epidemic engine.
//!
//! A [`Simulation`] owns the population and advances it one step at a time. During a step every
//! infectious person, in population order, meets up to [`CONTACTS_PER_STEP`] distinct living
//! people drawn at random. Transmissions found during the step are only queued. Once all contacts
//! are resolved, every infected person either dies or recovers with immunity, and only then do
//! the queued infections become active, ready to spread from the next step on.
use log::{debug, info, trace};

use crate::error::HerdError;
use crate::hashing::HashSet;
use crate::parameters::Parameters;
use crate::pathogen::Pathogen;
use crate::people::{Individual, PersonId, Population};
use crate::population_loader::load_population;
use crate::random::SimulationRng;
use crate::recorder::{EventRecorder, InteractionOutcome};
use crate::report::{SimulationReport, StepSummary};

/// Maximum number of people an infectious person meets in one step.
pub const CONTACTS_PER_STEP: usize = 100;

// Contact sampling gives up after this many draws per person in the population...
const DRAWS_PER_PERSON: usize = 64;
// ...but never before this many.
const MIN_DRAW_LIMIT: usize = 10_000;

/// Run counters and the queue of infections waiting to be activated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulationState {
    /// Everyone ever infected, including the initially infected.
    pub total_infected_ever: usize,
    pub currently_infected: usize,
    pub total_dead: usize,
    /// Living people who were vaccinated at the start or have recovered.
    pub vaccinated_or_immune: usize,
    /// Contacts where vaccination blocked a transmission.
    pub vaccination_prevented: usize,
    /// Contacts with a susceptible person that did not transmit.
    pub resistant_contacts: usize,
    newly_infected: Vec<PersonId>,
}

impl SimulationState {
    fn from_population(population: &Population) -> Self {
        let infected = population.count_infected();
        SimulationState {
            total_infected_ever: infected,
            currently_infected: infected,
            vaccinated_or_immune: population.count_immune(),
            ..SimulationState::default()
        }
    }

    /// Transmissions from the current step that have not been activated yet.
    #[must_use]
    pub fn pending_infections(&self) -> &[PersonId] {
        &self.newly_infected
    }
}

pub struct Simulation<R: EventRecorder> {
    pathogen: Pathogen,
    population: Population,
    state: SimulationState,
    rng: SimulationRng,
    recorder: R,
    current_step: usize,
    draw_limit: usize,
    history: Vec<StepSummary>,
}

impl<R: EventRecorder> Simulation<R> {
    /// Builds the population described by `parameters` and prepares a run that draws from
    /// `rng`. The run metadata is written to `recorder`.
    ///
    /// # Errors
    ///
    /// Returns `HerdError::InvalidConfiguration` if the parameters are invalid, or any error the
    /// recorder reports.
    pub fn new(
        parameters: &Parameters,
        rng: SimulationRng,
        recorder: R,
    ) -> Result<Self, HerdError> {
        parameters.validate()?;
        Self::from_validated(parameters, rng, recorder)
    }

    /// Like [`Simulation::new`], for parameters that already passed [`Parameters::validate`].
    pub(crate) fn from_validated(
        parameters: &Parameters,
        rng: SimulationRng,
        mut recorder: R,
    ) -> Result<Self, HerdError> {
        let pathogen = parameters.pathogen()?;
        let population = load_population(parameters, &pathogen, &mut recorder)?;
        let state = SimulationState::from_population(&population);
        let draw_limit = (DRAWS_PER_PERSON * population.len()).max(MIN_DRAW_LIMIT);

        Ok(Simulation {
            pathogen,
            population,
            state,
            rng,
            recorder,
            current_step: 0,
            draw_limit,
            history: Vec::new(),
        })
    }

    /// Sets how many draws a single contact round may take before failing with
    /// `HerdError::SamplingExhausted`.
    #[must_use]
    pub fn with_draw_limit(mut self, draw_limit: usize) -> Self {
        self.draw_limit = draw_limit;
        self
    }

    #[must_use]
    pub fn pathogen(&self) -> &Pathogen {
        &self.pathogen
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[must_use]
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    #[must_use]
    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    #[must_use]
    pub fn into_recorder(self) -> R {
        self.recorder
    }

    /// Number of steps run so far.
    #[must_use]
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Summaries of every step run so far.
    #[must_use]
    pub fn history(&self) -> &[StepSummary] {
        &self.history
    }

    /// True while someone could still change state: not everyone is dead or immune, and an
    /// infection is active or about to become active.
    #[must_use]
    pub fn should_continue(&self) -> bool {
        let settled = self.state.vaccinated_or_immune + self.state.total_dead;
        let spreading =
            self.state.currently_infected > 0 || !self.state.newly_infected.is_empty();
        settled < self.population.len() && spreading
    }

    /// Runs steps until [`Simulation::should_continue`] is false.
    ///
    /// # Errors
    ///
    /// Returns `HerdError::SamplingExhausted` if contact sampling gives up, or any error the
    /// recorder reports.
    pub fn run(&mut self) -> Result<SimulationReport, HerdError> {
        info!(
            "running {} through a population of {} (seed {})",
            self.pathogen.name(),
            self.population.len(),
            self.rng.base_seed()
        );
        while self.should_continue() {
            self.step()?;
        }
        self.recorder.flush()?;

        let report = self.report();
        info!("simulation ended after {} steps", report.steps);
        Ok(report)
    }

    /// The summary of the run as it stands.
    #[must_use]
    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            steps: self.current_step,
            population_size: self.population.len(),
            total_dead: self.state.total_dead,
            total_infected: self.state.total_infected_ever,
            vaccination_saves: self.state.vaccination_prevented,
        }
    }

    /// Runs one step: contact rounds for every infectious person, then deaths and recoveries,
    /// then activation of the infections transmitted during the step.
    ///
    /// # Errors
    ///
    /// Returns `HerdError::SamplingExhausted` if contact sampling gives up, or any error the
    /// recorder reports.
    pub fn step(&mut self) -> Result<StepSummary, HerdError> {
        self.current_step += 1;
        self.recorder.start_step(self.current_step);

        let pathogen = self.pathogen.id();
        let initiators: Vec<PersonId> = self
            .population
            .iter()
            .filter(|person| {
                person.is_alive() && !person.is_vaccinated() && person.is_infected_with(pathogen)
            })
            .map(Individual::id)
            .collect();

        // Nobody dies until the contact rounds are over.
        let alive = self.population.count_alive();
        let mut interacted = HashSet::default();
        let mut interactions = 0;
        for initiator in initiators {
            interactions += self.contact_round(initiator, alive, &mut interacted)?;
        }

        let (deaths, recoveries) = self.resolve_infections()?;
        let new_infections = self.activate_new_infections();

        let summary = StepSummary {
            step: self.current_step,
            interactions,
            new_infections,
            deaths,
            recoveries,
            total_infected: self.state.total_infected_ever,
            currently_infected: self.state.currently_infected,
            total_dead: self.state.total_dead,
            vaccinated_or_immune: self.state.vaccinated_or_immune,
            vaccination_saves: self.state.vaccination_prevented,
        };
        debug!(
            "step {}: {} contacts, {} new infections, {} deaths, {} recoveries",
            summary.step, interactions, new_infections, deaths, recoveries
        );
        self.history.push(summary);
        Ok(summary)
    }

    // Draws distinct living contacts for `initiator` from the whole population until the budget
    // is spent. The initiator can draw itself, which resolves as an already infected contact.
    // `interacted` is reset for every initiator, so the same target may be met by several
    // initiators in one step.
    fn contact_round(
        &mut self,
        initiator: PersonId,
        alive: usize,
        interacted: &mut HashSet<usize>,
    ) -> Result<usize, HerdError> {
        let population_size = self.population.len();
        let budget = CONTACTS_PER_STEP.min(alive);

        interacted.clear();

        let mut contacts = 0;
        let mut attempts = 0;
        while contacts < budget {
            if attempts == self.draw_limit {
                return Err(HerdError::SamplingExhausted {
                    initiator,
                    attempts,
                });
            }
            attempts += 1;

            let index = self.rng.sample_range(0..population_size);
            if !interacted.insert(index) {
                continue;
            }
            let target = PersonId(index);
            if !self.population[target].is_alive() {
                continue;
            }
            self.interact(initiator, target)?;
            contacts += 1;
        }
        Ok(contacts)
    }

    fn interact(
        &mut self,
        initiator: PersonId,
        target: PersonId,
    ) -> Result<InteractionOutcome, HerdError> {
        let person = &self.population[target];
        let outcome = if person.is_vaccinated() {
            self.state.vaccination_prevented += 1;
            InteractionOutcome::BlockedByVaccination
        } else if person.is_infected_with(self.pathogen.id()) {
            InteractionOutcome::AlreadyInfected
        } else if self
            .rng
            .sample_bool(self.pathogen.transmission_probability())
        {
            self.state.newly_infected.push(target);
            InteractionOutcome::Transmitted
        } else {
            self.state.resistant_contacts += 1;
            InteractionOutcome::NotTransmitted
        };

        trace!("{initiator:?} met {target:?}: {outcome:?}");
        self.recorder.log_interaction(
            &self.population[initiator],
            &self.population[target],
            outcome,
        )?;
        Ok(outcome)
    }

    // Every active case ends this step, in death or in immunity.
    fn resolve_infections(&mut self) -> Result<(usize, usize), HerdError> {
        let pathogen = self.pathogen.id();
        let mortality = self.pathogen.mortality_probability();
        let mut deaths = 0;
        let mut recoveries = 0;

        for person in self.population.iter_mut() {
            if !(person.is_alive() && !person.is_vaccinated() && person.is_infected_with(pathogen))
            {
                continue;
            }
            let died = self.rng.sample_bool(mortality);
            if died {
                person.die();
                self.state.total_dead += 1;
                deaths += 1;
            } else {
                person.recover();
                self.state.vaccinated_or_immune += 1;
                recoveries += 1;
            }
            self.state.currently_infected -= 1;

            trace!(
                "{:?} {}",
                person.id(),
                if died { "died" } else { "recovered" }
            );
            self.recorder.log_infection_outcome(person, died)?;
        }
        Ok((deaths, recoveries))
    }

    // A target can be queued by more than one initiator in the same step; it is only infected
    // once.
    fn activate_new_infections(&mut self) -> usize {
        let pathogen = self.pathogen.id();
        let pending = std::mem::take(&mut self.state.newly_infected);
        let mut activated = 0;

        for person_id in pending {
            let person = self
                .population
                .get_mut(person_id)
                .unwrap_or_else(|| panic!("pending infection for unknown {person_id:?}"));
            if person.is_infected_with(pathogen) {
                continue;
            }
            assert!(
                person.is_susceptible(),
                "pending infection for {person_id:?}, who is not susceptible"
            );
            person.infect(pathogen);
            self.state.total_infected_ever += 1;
            self.state.currently_infected += 1;
            activated += 1;
        }
        activated
    }
}
