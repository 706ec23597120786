use learn_core::model::{Program, ProgramSlug, Unit, UnitId};
use storage::repository::{ProgramRepository, UnitRepository};

use crate::error::ProgressError;

/// A published program with its published `day` units in learner order.
///
/// A learner's day number is the 1-based position in `days`, so gaps in
/// authoring indices never leave the pointer on a missing day.
#[derive(Debug, Clone)]
pub(crate) struct PublishedProgram {
    pub program: Program,
    pub days: Vec<Unit>,
}

impl PublishedProgram {
    /// Count of published days.
    pub fn total(&self) -> u32 {
        u32::try_from(self.days.len()).unwrap_or(u32::MAX)
    }

    /// Day number of a unit, if it is one of the published days.
    pub fn day_of(&self, unit_id: UnitId) -> Option<(u32, &Unit)> {
        self.days
            .iter()
            .zip(1_u32..)
            .find(|(unit, _)| unit.id() == unit_id)
            .map(|(unit, day)| (day, unit))
    }

    pub fn unit_for_day(&self, day: u32) -> Option<&Unit> {
        let idx = usize::try_from(day.checked_sub(1)?).ok()?;
        self.days.get(idx)
    }
}

/// Load a program visible to learners.
///
/// Draft programs are reported as not found.
///
/// # Errors
///
/// Returns `ProgressError::ProgramNotFound` or `ProgressError::Storage`.
pub(crate) async fn load_published(
    programs: &dyn ProgramRepository,
    units: &dyn UnitRepository,
    slug: &ProgramSlug,
) -> Result<PublishedProgram, ProgressError> {
    let program = programs
        .get_program(slug)
        .await?
        .filter(Program::is_published)
        .ok_or_else(|| ProgressError::ProgramNotFound(slug.to_string()))?;
    let days = units
        .list_units(slug)
        .await?
        .into_iter()
        .filter(Unit::is_published_day)
        .collect();
    Ok(PublishedProgram { program, days })
}
