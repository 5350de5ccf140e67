use serde::{Deserialize, Serialize};

use crate::error::HerdError;

/// Tag stored on an infected individual. A run has exactly one pathogen, so the engine compares
/// tags instead of names.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathogenId(pub u8);

/// The virus being simulated. Fixed for the lifetime of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Pathogen {
    id: PathogenId,
    name: String,
    transmission_probability: f64,
    mortality_probability: f64,
}

/// Checks that `value` is a probability. NaN is rejected along with anything outside [0, 1].
pub(crate) fn check_probability(name: &str, value: f64) -> Result<(), HerdError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(HerdError::InvalidConfiguration(format!(
            "{name} must be between 0 and 1, got {value}"
        )))
    }
}

impl Pathogen {
    /// # Errors
    ///
    /// Returns `HerdError::InvalidConfiguration` if either probability is outside [0, 1].
    pub fn new(
        name: impl Into<String>,
        transmission_probability: f64,
        mortality_probability: f64,
    ) -> Result<Self, HerdError> {
        check_probability("transmission probability", transmission_probability)?;
        check_probability("mortality probability", mortality_probability)?;
        Ok(Pathogen {
            id: PathogenId(0),
            name: name.into(),
            transmission_probability,
            mortality_probability,
        })
    }

    #[must_use]
    pub fn id(&self) -> PathogenId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Chance that a contact with a susceptible person infects them.
    #[must_use]
    pub fn transmission_probability(&self) -> f64 {
        self.transmission_probability
    }

    /// Chance that an infected person dies at the end of a step instead of recovering.
    #[must_use]
    pub fn mortality_probability(&self) -> f64 {
        self.mortality_probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pathogen_instantiation() {
        let cholera = Pathogen::new("Cholera", 0.0213, 0.163).unwrap();
        assert_eq!(cholera.name(), "Cholera");
        assert_eq!(cholera.transmission_probability(), 0.0213);
        assert_eq!(cholera.mortality_probability(), 0.163);
        assert_eq!(cholera.id(), PathogenId(0));
    }

    #[test]
    fn boundary_probabilities_are_valid() {
        assert!(Pathogen::new("Certain", 1.0, 0.0).is_ok());
        assert!(Pathogen::new("Harmless", 0.0, 1.0).is_ok());
    }

    #[test]
    fn out_of_range_probabilities_are_rejected() {
        for (transmission, mortality) in [(1.5, 0.1), (0.5, -0.1), (f64::NAN, 0.1)] {
            let result = Pathogen::new("Bad", transmission, mortality);
            assert!(
                matches!(result, Err(HerdError::InvalidConfiguration(_))),
                "({transmission}, {mortality}) should be rejected"
            );
        }
    }
}
