use log::{info, trace};

use crate::error::HerdError;
use crate::parameters::Parameters;
use crate::pathogen::Pathogen;
use crate::people::{Individual, PersonId, Population};
use crate::recorder::{EventRecorder, RunMetadata};

/// Populates the "world" with `population_size` people: the first `initial_infected` carry
/// `pathogen`, the next `vaccinated_count()` are vaccinated, and everyone else is susceptible.
/// Writes the run metadata to `recorder`. `parameters` must already have passed
/// [`Parameters::validate`].
///
/// # Errors
///
/// Returns any error the recorder reports while writing the metadata.
pub fn load_population(
    parameters: &Parameters,
    pathogen: &Pathogen,
    recorder: &mut impl EventRecorder,
) -> Result<Population, HerdError> {
    trace!("Initializing population");

    let infected = parameters.initial_infected;
    let vaccinated = parameters.vaccinated_count();

    let people = (0..parameters.population_size)
        .map(|index| {
            let id = PersonId(index);
            if index < infected {
                Individual::infected(id, pathogen.id())
            } else if index < infected + vaccinated {
                Individual::vaccinated(id)
            } else {
                Individual::susceptible(id)
            }
        })
        .collect();

    recorder.write_metadata(&RunMetadata {
        population_size: parameters.population_size,
        vaccination_percentage: parameters.vaccination_percentage,
        virus_name: pathogen.name().to_string(),
        mortality_rate: pathogen.mortality_probability(),
        transmission_rate: pathogen.transmission_probability(),
    })?;

    info!(
        "created population of {} ({} infected, {} vaccinated)",
        parameters.population_size, infected, vaccinated
    );
    Ok(Population::from_people(people))
}
