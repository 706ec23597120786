use std::sync::Arc;

use learn_core::model::{DayAdvance, DayDraft, DayState, Enrollment, ProgramSlug, UnitId, UserId};
use storage::repository::{
    DayStateRepository, EnrollmentRepository, ProgramRepository, ProgressStore, UnitRepository,
};
use tracing::{debug, info};

use super::queries::load_published;
use super::view::DaySaveOutcome;
use crate::Clock;
use crate::error::ProgressError;

/// One save of a day's journal: an autosave tick or a validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveDayRequest {
    pub program_slug: ProgramSlug,
    pub unit_id: UnitId,
    pub draft: DayDraft,
    /// Ask for the day to be validated.
    pub completed: bool,
}

/// Writes day journals and advances the enrollment on validation.
#[derive(Clone)]
pub struct JournalService {
    clock: Clock,
    programs: Arc<dyn ProgramRepository>,
    units: Arc<dyn UnitRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    day_states: Arc<dyn DayStateRepository>,
    store: Arc<dyn ProgressStore>,
}

impl JournalService {
    #[must_use]
    pub fn new(
        clock: Clock,
        programs: Arc<dyn ProgramRepository>,
        units: Arc<dyn UnitRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        day_states: Arc<dyn DayStateRepository>,
        store: Arc<dyn ProgressStore>,
    ) -> Self {
        Self {
            clock,
            programs,
            units,
            enrollments,
            day_states,
            store,
        }
    }

    /// Upsert the day's journal and, when asked, validate the day.
    ///
    /// A failed validation writes nothing. Validating the enrollment's active
    /// day moves the pointer, or completes the program on the last day, even
    /// when that day was already completed earlier. The move is stored in the
    /// same transaction as the day.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::ProgramNotFound` / `ProgressError::UnitNotFound`
    /// for targets outside the published days, `ProgressError::DayState` for
    /// invalid sliders or an unmet validation predicate, and
    /// `ProgressError::Storage` if persistence fails.
    pub async fn save_day(
        &self,
        user_id: UserId,
        request: SaveDayRequest,
    ) -> Result<DaySaveOutcome, ProgressError> {
        let SaveDayRequest {
            program_slug: slug,
            unit_id,
            draft,
            completed,
        } = request;

        let published = load_published(self.programs.as_ref(), self.units.as_ref(), &slug).await?;
        let total = published.total();
        let (day, unit) = published
            .day_of(unit_id)
            .ok_or(ProgressError::UnitNotFound(unit_id))?;
        let journal = unit.journal();
        draft.validate(journal)?;

        let now = self.clock.now();
        let mut state = match self.day_states.get_day_state(user_id, &slug, day).await? {
            Some(existing) => existing,
            None => DayState::empty(user_id, slug.clone(), day, now)?,
        };
        state.apply_draft(draft, now);
        let newly_completed = if completed {
            state.complete(journal, now)?
        } else {
            false
        };

        let (mut enrollment, created) = match self.enrollments.get_enrollment(user_id, &slug).await? {
            Some(existing) => (existing, false),
            None => (Enrollment::start(user_id, slug.clone(), now), true),
        };
        // A day validated ahead of time still moves the pointer once it is active.
        let advance = if completed && state.completed() {
            enrollment.record_completed_day(day, total, now)
        } else {
            DayAdvance::Unchanged
        };

        if created || advance.moved() {
            self.store.commit_day(&state, &enrollment).await?;
        } else {
            self.day_states.upsert_day_state(&state).await?;
        }

        match advance {
            DayAdvance::Advanced { to } => {
                info!(user = %user_id, program = %slug, day, to, "day validated");
            }
            DayAdvance::ProgramCompleted => {
                info!(user = %user_id, program = %slug, day, "program completed");
            }
            DayAdvance::Unchanged => {
                debug!(
                    user = %user_id,
                    program = %slug,
                    day,
                    completed = state.completed(),
                    "day saved"
                );
            }
        }

        Ok(DaySaveOutcome {
            day,
            completed: state.completed(),
            newly_completed,
            advance,
            current_day: enrollment.progress(total).current_day,
            status: enrollment.status(),
        })
    }
}
