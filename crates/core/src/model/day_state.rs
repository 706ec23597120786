use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::slug::ProgramSlug;
use crate::model::unit::JournalSchema;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum DayStateError {
    #[error("day must be >= 1")]
    InvalidDay,

    #[error("slider {key} is not a finite number")]
    NonFiniteSlider { key: String },

    #[error("slider {key} = {value} is outside [{min}, {max}]")]
    SliderOutOfRange {
        key: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("the day must be practiced before it can be validated")]
    NotPracticed,

    #[error("at least one answer is required to validate the day")]
    MissingAnswer,
}

/// Where a learner stands on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    Untouched,
    Draft,
    Completed,
}

impl DayPhase {
    #[must_use]
    pub fn of(state: Option<&DayState>) -> Self {
        match state {
            None => DayPhase::Untouched,
            Some(s) if s.completed() => DayPhase::Completed,
            Some(_) => DayPhase::Draft,
        }
    }
}

/// Editable part of a day's journal, as sent by an autosave tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DayDraft {
    pub data: BTreeMap<String, String>,
    pub sliders: BTreeMap<String, f64>,
    pub practiced: bool,
    pub mantra3x: bool,
}

impl DayDraft {
    /// Check slider values against the unit's journal.
    ///
    /// Keys the journal does not declare are kept as-is.
    ///
    /// # Errors
    ///
    /// Returns `DayStateError` for non-finite or out-of-range slider values.
    pub fn validate(&self, journal: &JournalSchema) -> Result<(), DayStateError> {
        for (key, value) in &self.sliders {
            if !value.is_finite() {
                return Err(DayStateError::NonFiniteSlider { key: key.clone() });
            }
            let Some(def) = journal.slider(key) else {
                continue;
            };
            if *value < def.min || *value > def.max {
                return Err(DayStateError::SliderOutOfRange {
                    key: key.clone(),
                    value: *value,
                    min: def.min,
                    max: def.max,
                });
            }
        }
        Ok(())
    }
}

/// Journal and completion record for one (user, program, day).
#[derive(Debug, Clone, PartialEq)]
pub struct DayState {
    user_id: UserId,
    program_slug: ProgramSlug,
    day: u32,
    data: BTreeMap<String, String>,
    sliders: BTreeMap<String, f64>,
    practiced: bool,
    mantra3x: bool,
    completed: bool,
    updated_at: DateTime<Utc>,
}

impl DayState {
    /// An empty draft for a day nobody has touched yet.
    ///
    /// # Errors
    ///
    /// Returns `DayStateError::InvalidDay` for day 0.
    pub fn empty(
        user_id: UserId,
        program_slug: ProgramSlug,
        day: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, DayStateError> {
        Self::from_persisted(
            user_id,
            program_slug,
            day,
            DayDraft::default(),
            false,
            now,
        )
    }

    /// Rehydrate a stored record.
    ///
    /// # Errors
    ///
    /// Returns `DayStateError::InvalidDay` for day 0.
    pub fn from_persisted(
        user_id: UserId,
        program_slug: ProgramSlug,
        day: u32,
        draft: DayDraft,
        completed: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DayStateError> {
        if day == 0 {
            return Err(DayStateError::InvalidDay);
        }
        Ok(Self {
            user_id,
            program_slug,
            day,
            data: draft.data,
            sliders: draft.sliders,
            practiced: draft.practiced,
            mantra3x: draft.mantra3x,
            completed,
            updated_at,
        })
    }

    /// Replace the editable fields. Completion is never cleared here.
    pub fn apply_draft(&mut self, draft: DayDraft, now: DateTime<Utc>) {
        self.data = draft.data;
        self.sliders = draft.sliders;
        self.practiced = draft.practiced;
        self.mantra3x = draft.mantra3x;
        self.updated_at = now;
    }

    /// The minimum predicate for validating a day.
    ///
    /// # Errors
    ///
    /// Returns `DayStateError::NotPracticed` or `DayStateError::MissingAnswer`.
    pub fn check_completable(&self, journal: &JournalSchema) -> Result<(), DayStateError> {
        if !self.practiced {
            return Err(DayStateError::NotPracticed);
        }
        let mut required = journal.required_questions().peekable();
        if required.peek().is_none() {
            return Ok(());
        }
        let answered = journal.questions.iter().any(|q| {
            self.data
                .get(&q.key)
                .is_some_and(|answer| !answer.trim().is_empty())
        });
        if answered {
            Ok(())
        } else {
            Err(DayStateError::MissingAnswer)
        }
    }

    /// Flip to completed if the predicate holds.
    ///
    /// Returns `true` only on the first completion.
    ///
    /// # Errors
    ///
    /// Returns the predicate failure; the record is left unchanged.
    pub fn complete(
        &mut self,
        journal: &JournalSchema,
        now: DateTime<Utc>,
    ) -> Result<bool, DayStateError> {
        if self.completed {
            return Ok(false);
        }
        self.check_completable(journal)?;
        self.completed = true;
        self.updated_at = now;
        Ok(true)
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
    pub fn day(&self) -> u32 {
        self.day
    }

    #[must_use]
    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.data
    }

    #[must_use]
    pub fn sliders(&self) -> &BTreeMap<String, f64> {
        &self.sliders
    }

    #[must_use]
    pub fn practiced(&self) -> bool {
        self.practiced
    }

    #[must_use]
    pub fn mantra3x(&self) -> bool {
        self.mantra3x
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::unit::{QuestionDef, SliderDef};
    use crate::time::fixed_now;

    fn journal() -> JournalSchema {
        JournalSchema {
            sliders: vec![SliderDef {
                key: "calme".into(),
                label: "Calme".into(),
                min: 0.0,
                max: 10.0,
            }],
            questions: vec![
                QuestionDef {
                    key: "intention".into(),
                    label: "Intention".into(),
                    required: true,
                },
                QuestionDef {
                    key: "ressenti".into(),
                    label: "Ressenti".into(),
                    required: true,
                },
            ],
            checks: vec![],
        }
    }

    fn state() -> DayState {
        DayState::empty(
            UserId::new(1),
            ProgramSlug::parse("sept-jours").unwrap(),
            1,
            fixed_now(),
        )
        .unwrap()
    }

    fn draft(practiced: bool, answers: &[(&str, &str)]) -> DayDraft {
        DayDraft {
            data: answers
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            practiced,
            ..DayDraft::default()
        }
    }

    #[test]
    fn phase_follows_record() {
        let mut s = state();
        assert_eq!(DayPhase::of(None), DayPhase::Untouched);
        assert_eq!(DayPhase::of(Some(&s)), DayPhase::Draft);
        s.apply_draft(draft(true, &[("intention", "respirer")]), fixed_now());
        s.complete(&journal(), fixed_now()).unwrap();
        assert_eq!(DayPhase::of(Some(&s)), DayPhase::Completed);
    }

    #[test]
    fn not_practiced_blocks_even_with_all_answers() {
        let mut s = state();
        s.apply_draft(
            draft(false, &[("intention", "a"), ("ressenti", "b")]),
            fixed_now(),
        );
        assert_eq!(
            s.complete(&journal(), fixed_now()),
            Err(DayStateError::NotPracticed)
        );
        assert!(!s.completed());
    }

    #[test]
    fn one_answer_is_enough() {
        let mut s = state();
        s.apply_draft(draft(true, &[("ressenti", "apaisé")]), fixed_now());
        assert_eq!(s.complete(&journal(), fixed_now()), Ok(true));
    }

    #[test]
    fn blank_answers_do_not_count() {
        let mut s = state();
        s.apply_draft(draft(true, &[("intention", "   ")]), fixed_now());
        assert_eq!(
            s.complete(&journal(), fixed_now()),
            Err(DayStateError::MissingAnswer)
        );
    }

    #[test]
    fn no_required_questions_only_needs_practice() {
        let mut s = state();
        s.apply_draft(draft(true, &[]), fixed_now());
        assert_eq!(s.complete(&JournalSchema::default(), fixed_now()), Ok(true));
    }

    #[test]
    fn completion_survives_later_drafts() {
        let mut s = state();
        s.apply_draft(draft(true, &[("intention", "x")]), fixed_now());
        s.complete(&journal(), fixed_now()).unwrap();
        s.apply_draft(draft(false, &[]), fixed_now());
        assert!(s.completed());
        assert_eq!(s.complete(&journal(), fixed_now()), Ok(false));
    }

    #[test]
    fn draft_rejects_out_of_range_slider() {
        let mut d = DayDraft::default();
        d.sliders.insert("calme".into(), 11.0);
        assert!(matches!(
            d.validate(&journal()),
            Err(DayStateError::SliderOutOfRange { .. })
        ));
        d.sliders.insert("calme".into(), f64::NAN);
        assert!(matches!(
            d.validate(&journal()),
            Err(DayStateError::NonFiniteSlider { .. })
        ));
    }

    #[test]
    fn draft_accepts_undeclared_slider() {
        let mut d = DayDraft::default();
        d.sliders.insert("humeur".into(), 42.0);
        assert!(d.validate(&journal()).is_ok());
    }

    #[test]
    fn day_zero_is_rejected() {
        let err = DayState::empty(
            UserId::new(1),
            ProgramSlug::parse("x").unwrap(),
            0,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, DayStateError::InvalidDay);
    }
}
