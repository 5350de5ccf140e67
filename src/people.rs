//! Individuals and the population that holds them.
//!
//! A [`Population`] is created once by the population loader and then only mutated in place:
//! nobody is ever added or removed, and death is a status flip. A person's [`PersonId`] is their
//! index in the population.
use std::fmt::{Debug, Display, Formatter};
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::pathogen::PathogenId;

/// Represents a unique person.
//  the id refers to that person's index in the range 0 to population
// - 1 in the `Population` container.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonId(pub usize);

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Person {}", self.0)
    }
}

/// A single agent of the simulation.
///
/// `vaccinated` doubles as the immunity flag: it is set at creation for vaccinated people and
/// after recovering from an infection. `infection` is only present while the person is
/// infectious, so it is never set together with `vaccinated` and is cleared on death.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Individual {
    id: PersonId,
    vaccinated: bool,
    infection: Option<PathogenId>,
    alive: bool,
}

impl Individual {
    #[must_use]
    pub fn susceptible(id: PersonId) -> Self {
        Individual {
            id,
            vaccinated: false,
            infection: None,
            alive: true,
        }
    }

    #[must_use]
    pub fn vaccinated(id: PersonId) -> Self {
        Individual {
            vaccinated: true,
            ..Individual::susceptible(id)
        }
    }

    #[must_use]
    pub fn infected(id: PersonId, pathogen: PathogenId) -> Self {
        Individual {
            infection: Some(pathogen),
            ..Individual::susceptible(id)
        }
    }

    #[must_use]
    pub fn id(&self) -> PersonId {
        self.id
    }

    #[must_use]
    pub fn is_vaccinated(&self) -> bool {
        self.vaccinated
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    #[must_use]
    pub fn infection(&self) -> Option<PathogenId> {
        self.infection
    }

    /// True if the person currently carries `pathogen`.
    #[must_use]
    pub fn is_infected_with(&self, pathogen: PathogenId) -> bool {
        self.infection == Some(pathogen)
    }

    /// Alive, never infected, and not immune.
    #[must_use]
    pub fn is_susceptible(&self) -> bool {
        self.alive && !self.vaccinated && self.infection.is_none()
    }

    pub(crate) fn infect(&mut self, pathogen: PathogenId) {
        debug_assert!(self.alive && !self.vaccinated, "{:?} cannot be infected", self.id);
        self.infection = Some(pathogen);
    }

    pub(crate) fn die(&mut self) {
        self.alive = false;
        self.infection = None;
    }

    pub(crate) fn recover(&mut self) {
        self.vaccinated = true;
        self.infection = None;
    }
}

/// The ordered, fixed-size collection of every individual in a run.
#[derive(Clone, Debug, Default)]
pub struct Population {
    people: Vec<Individual>,
}

impl Population {
    pub(crate) fn from_people(people: Vec<Individual>) -> Self {
        debug_assert!(people.iter().enumerate().all(|(i, p)| p.id == PersonId(i)));
        Population { people }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.people.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    #[must_use]
    pub fn get(&self, person_id: PersonId) -> Option<&Individual> {
        self.people.get(person_id.0)
    }

    pub(crate) fn get_mut(&mut self, person_id: PersonId) -> Option<&mut Individual> {
        self.people.get_mut(person_id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Individual> {
        self.people.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Individual> {
        self.people.iter_mut()
    }

    #[must_use]
    pub fn count_alive(&self) -> usize {
        self.iter().filter(|p| p.is_alive()).count()
    }

    #[must_use]
    pub fn count_dead(&self) -> usize {
        self.len() - self.count_alive()
    }

    #[must_use]
    pub fn count_infected(&self) -> usize {
        self.iter().filter(|p| p.infection().is_some()).count()
    }

    /// Living people who are vaccinated or have recovered.
    #[must_use]
    pub fn count_immune(&self) -> usize {
        self.iter()
            .filter(|p| p.is_alive() && p.is_vaccinated())
            .count()
    }

    #[must_use]
    pub fn count_susceptible(&self) -> usize {
        self.iter().filter(|p| p.is_susceptible()).count()
    }
}

impl Index<PersonId> for Population {
    type Output = Individual;

    fn index(&self, person_id: PersonId) -> &Individual {
        &self.people[person_id.0]
    }
}

impl IndexMut<PersonId> for Population {
    fn index_mut(&mut self, person_id: PersonId) -> &mut Individual {
        &mut self.people[person_id.0]
    }
}
