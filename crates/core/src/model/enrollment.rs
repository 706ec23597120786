use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::slug::ProgramSlug;
use crate::progress::{ProgressSnapshot, clamp_day};

/// Keyword a learner types to confirm wiping a program.
pub const RESET_KEYWORD: &str = "RECOMMENCER";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EnrollmentError {
    #[error("current day must be >= 1")]
    InvalidCurrentDay,

    #[error("unknown enrollment status: {0}")]
    UnknownStatus(String),

    #[error("a completed program cannot be paused")]
    AlreadyCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Paused,
}

impl EnrollmentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Paused => "paused",
        }
    }

    /// # Errors
    ///
    /// Returns `EnrollmentError::UnknownStatus` for unrecognised values.
    pub fn parse(value: &str) -> Result<Self, EnrollmentError> {
        match value {
            "active" => Ok(EnrollmentStatus::Active),
            "completed" => Ok(EnrollmentStatus::Completed),
            "paused" => Ok(EnrollmentStatus::Paused),
            other => Err(EnrollmentError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Effect of validating a day on the enrollment pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayAdvance {
    /// The validated day was not the active one, or the program was already done.
    Unchanged,
    /// The pointer moved to the given day.
    Advanced { to: u32 },
    /// The last published day was validated.
    ProgramCompleted,
}

impl DayAdvance {
    #[must_use]
    pub fn moved(self) -> bool {
        !matches!(self, DayAdvance::Unchanged)
    }
}

/// A learner's pointer and lifecycle status for one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    user_id: UserId,
    program_slug: ProgramSlug,
    status: EnrollmentStatus,
    current_day: u32,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Starts a program on day 1.
    #[must_use]
    pub fn start(user_id: UserId, program_slug: ProgramSlug, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            program_slug,
            status: EnrollmentStatus::Active,
            current_day: 1,
            started_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate an enrollment from storage.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::InvalidCurrentDay` if the stored day is zero.
    pub fn from_persisted(
        user_id: UserId,
        program_slug: ProgramSlug,
        status: EnrollmentStatus,
        current_day: u32,
        started_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, EnrollmentError> {
        if current_day == 0 {
            return Err(EnrollmentError::InvalidCurrentDay);
        }
        Ok(Self {
            user_id,
            program_slug,
            status,
            current_day,
            started_at,
            updated_at,
        })
    }

    /// Moves the pointer, clamped to the published days. The status is kept.
    pub fn set_day(&mut self, day: u32, total: u32, now: DateTime<Utc>) {
        self.current_day = clamp_day(day, total);
        self.updated_at = now;
    }

    /// Applies the validation of `day`.
    ///
    /// Only the active day moves the pointer; validating it also lifts a pause.
    pub fn record_completed_day(&mut self, day: u32, total: u32, now: DateTime<Utc>) -> DayAdvance {
        if total == 0 || self.status == EnrollmentStatus::Completed {
            return DayAdvance::Unchanged;
        }
        let active = clamp_day(self.current_day, total);
        if day != active {
            return DayAdvance::Unchanged;
        }
        self.updated_at = now;
        if day >= total {
            self.current_day = total;
            self.status = EnrollmentStatus::Completed;
            DayAdvance::ProgramCompleted
        } else {
            self.current_day = day + 1;
            self.status = EnrollmentStatus::Active;
            DayAdvance::Advanced { to: day + 1 }
        }
    }

    /// # Errors
    ///
    /// Returns `EnrollmentError::AlreadyCompleted` for a finished program.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), EnrollmentError> {
        if self.status == EnrollmentStatus::Completed {
            return Err(EnrollmentError::AlreadyCompleted);
        }
        self.status = EnrollmentStatus::Paused;
        self.updated_at = now;
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.status == EnrollmentStatus::Paused {
            self.status = EnrollmentStatus::Active;
            self.updated_at = now;
        }
    }

    /// Back to day 1, active. Day states are wiped separately by the store.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.current_day = 1;
        self.status = EnrollmentStatus::Active;
        self.updated_at = now;
    }

    #[must_use]
    pub fn progress(&self, total: u32) -> ProgressSnapshot {
        ProgressSnapshot::compute(self.status, self.current_day, total)
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn program_slug(&self) -> &ProgramSlug {
        &self.program_slug
    }

    #[must_use]
    pub fn status(&self) -> EnrollmentStatus {
        self.status
    }

    #[must_use]
    pub fn current_day(&self) -> u32 {
        self.current_day
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// True when the typed confirmation matches `RESET_KEYWORD`, ignoring case
/// and surrounding whitespace.
#[must_use]
pub fn confirms_reset(typed: &str) -> bool {
    typed.trim().eq_ignore_ascii_case(RESET_KEYWORD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn enrollment() -> Enrollment {
        Enrollment::start(
            UserId::new(1),
            ProgramSlug::parse("sept-jours").unwrap(),
            fixed_now(),
        )
    }

    #[test]
    fn set_day_clamps_to_published_days() {
        let mut e = enrollment();
        e.set_day(57, 7, fixed_now());
        assert_eq!(e.current_day(), 7);
        e.set_day(0, 7, fixed_now());
        assert_eq!(e.current_day(), 1);
        e.set_day(4, 0, fixed_now());
        assert_eq!(e.current_day(), 1);
    }

    #[test]
    fn validating_active_day_advances() {
        let mut e = enrollment();
        assert_eq!(
            e.record_completed_day(1, 3, fixed_now()),
            DayAdvance::Advanced { to: 2 }
        );
        assert_eq!(e.current_day(), 2);
        assert_eq!(e.status(), EnrollmentStatus::Active);
    }

    #[test]
    fn validating_other_day_keeps_pointer() {
        let mut e = enrollment();
        e.set_day(3, 7, fixed_now());
        assert_eq!(e.record_completed_day(1, 7, fixed_now()), DayAdvance::Unchanged);
        assert_eq!(e.current_day(), 3);
    }

    #[test]
    fn validating_last_day_completes_program() {
        let mut e = enrollment();
        e.set_day(3, 3, fixed_now());
        assert_eq!(
            e.record_completed_day(3, 3, fixed_now()),
            DayAdvance::ProgramCompleted
        );
        assert_eq!(e.status(), EnrollmentStatus::Completed);
        assert_eq!(e.current_day(), 3);
        assert_eq!(e.progress(3).percent, 100);
        assert_eq!(e.record_completed_day(3, 3, fixed_now()), DayAdvance::Unchanged);
    }

    #[test]
    fn validating_while_paused_resumes() {
        let mut e = enrollment();
        e.pause(fixed_now()).unwrap();
        e.record_completed_day(1, 3, fixed_now());
        assert_eq!(e.status(), EnrollmentStatus::Active);
    }

    #[test]
    fn completed_program_cannot_pause() {
        let mut e = enrollment();
        e.record_completed_day(1, 1, fixed_now());
        assert_eq!(e.pause(fixed_now()), Err(EnrollmentError::AlreadyCompleted));
    }

    #[test]
    fn reset_returns_to_day_one() {
        let mut e = enrollment();
        e.record_completed_day(1, 1, fixed_now());
        e.reset(fixed_now());
        assert_eq!(e.current_day(), 1);
        assert_eq!(e.status(), EnrollmentStatus::Active);
    }

    #[test]
    fn persisted_day_zero_is_rejected() {
        let err = Enrollment::from_persisted(
            UserId::new(1),
            ProgramSlug::parse("x").unwrap(),
            EnrollmentStatus::Active,
            0,
            fixed_now(),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, EnrollmentError::InvalidCurrentDay);
    }

    #[test]
    fn reset_keyword_is_case_insensitive() {
        assert!(confirms_reset("  recommencer "));
        assert!(!confirms_reset("recommence"));
    }
}
