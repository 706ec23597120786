use std::sync::Arc;

use learn_core::model::{DayState, Enrollment, ProgramSlug, UserId};
use learn_core::ProgressSnapshot;
use storage::repository::{
    DayStateRepository, EnrollmentRepository, ProgramRepository, ProgressStore, UnitRepository,
};
use tracing::{debug, info};

use super::queries::{PublishedProgram, load_published};
use super::view::{Dashboard, PlanItem, ProgramSummary};
use crate::Clock;
use crate::error::ProgressError;

/// Upper bound for a single plan listing.
pub const DEFAULT_PLAN_LIMIT_MAX: u32 = 365;

/// Learner-facing reads and pointer moves: summary, plan, `setDay`,
/// pause/resume, dashboard and resets.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    plan_limit_max: u32,
    programs: Arc<dyn ProgramRepository>,
    units: Arc<dyn UnitRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    day_states: Arc<dyn DayStateRepository>,
    store: Arc<dyn ProgressStore>,
}

impl ProgressService {
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
            plan_limit_max: DEFAULT_PLAN_LIMIT_MAX,
            programs,
            units,
            enrollments,
            day_states,
            store,
        }
    }

    #[must_use]
    pub fn with_plan_limit_max(mut self, max: u32) -> Self {
        self.plan_limit_max = max.max(1);
        self
    }

    async fn published(&self, slug: &ProgramSlug) -> Result<PublishedProgram, ProgressError> {
        load_published(self.programs.as_ref(), self.units.as_ref(), slug).await
    }

    async fn summarize(
        &self,
        user_id: UserId,
        published: &PublishedProgram,
        enrollment: Option<&Enrollment>,
    ) -> Result<ProgramSummary, ProgressError> {
        let total = published.total();
        let slug = published.program.slug();
        let progress = enrollment.map_or_else(
            || ProgressSnapshot::not_started(total),
            |e| e.progress(total),
        );
        let completed_days = self
            .day_states
            .list_day_states(user_id, slug)
            .await?
            .iter()
            .filter(|s| s.completed() && s.day() <= total)
            .count();
        Ok(ProgramSummary {
            program_slug: slug.clone(),
            title: published.program.title().to_owned(),
            progress,
            started: enrollment.is_some(),
            completed_days: u32::try_from(completed_days).unwrap_or(u32::MAX),
            updated_at: enrollment.map(Enrollment::updated_at),
        })
    }

    /// Progress of `user_id` on one program.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::ProgramNotFound` for unknown or draft programs.
    pub async fn summary(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
    ) -> Result<ProgramSummary, ProgressError> {
        let published = self.published(slug).await?;
        let enrollment = self.enrollments.get_enrollment(user_id, slug).await?;
        self.summarize(user_id, &published, enrollment.as_ref()).await
    }

    /// Published days in order, capped at the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::ProgramNotFound` for unknown or draft programs.
    pub async fn plan(
        &self,
        slug: &ProgramSlug,
        limit: Option<u32>,
    ) -> Result<Vec<PlanItem>, ProgressError> {
        let limit = limit.map_or(self.plan_limit_max, |l| l.min(self.plan_limit_max));
        let published = self.published(slug).await?;
        Ok(published
            .days
            .iter()
            .zip(1_u32..)
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(unit, index)| PlanItem {
                index,
                unit_id: unit.id(),
                title: unit.title().to_owned(),
            })
            .collect())
    }

    /// Move the day pointer, starting the program if needed.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::ProgramNotFound` for unknown or draft programs.
    pub async fn set_day(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
        day: u32,
    ) -> Result<Enrollment, ProgressError> {
        let published = self.published(slug).await?;
        let now = self.clock.now();
        let mut enrollment = match self.enrollments.get_enrollment(user_id, slug).await? {
            Some(existing) => existing,
            None => {
                info!(user = %user_id, program = %slug, "program started");
                Enrollment::start(user_id, slug.clone(), now)
            }
        };
        enrollment.set_day(day, published.total(), now);
        self.enrollments.upsert_enrollment(&enrollment).await?;
        debug!(
            user = %user_id,
            program = %slug,
            current_day = enrollment.current_day(),
            "day pointer set"
        );
        Ok(enrollment)
    }

    async fn existing_enrollment(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
    ) -> Result<Enrollment, ProgressError> {
        self.published(slug).await?;
        self.enrollments
            .get_enrollment(user_id, slug)
            .await?
            .ok_or_else(|| ProgressError::NotEnrolled(slug.to_string()))
    }

    /// # Errors
    ///
    /// Returns `ProgressError::NotEnrolled` without an enrollment and
    /// `ProgressError::Enrollment` for a completed program.
    pub async fn pause(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
    ) -> Result<Enrollment, ProgressError> {
        let mut enrollment = self.existing_enrollment(user_id, slug).await?;
        enrollment.pause(self.clock.now())?;
        self.enrollments.upsert_enrollment(&enrollment).await?;
        info!(user = %user_id, program = %slug, "program paused");
        Ok(enrollment)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::NotEnrolled` without an enrollment.
    pub async fn resume(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
    ) -> Result<Enrollment, ProgressError> {
        let mut enrollment = self.existing_enrollment(user_id, slug).await?;
        enrollment.resume(self.clock.now());
        self.enrollments.upsert_enrollment(&enrollment).await?;
        info!(user = %user_id, program = %slug, "program resumed");
        Ok(enrollment)
    }

    /// Summaries for every enrollment of a member, most recent first.
    ///
    /// Enrollments whose program is no longer published are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if repository access fails.
    pub async fn dashboard(&self, user_id: UserId) -> Result<Dashboard, ProgressError> {
        let enrollments = self.enrollments.list_enrollments(user_id).await?;
        let mut summaries = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            let published = match self.published(enrollment.program_slug()).await {
                Ok(published) => published,
                Err(ProgressError::ProgramNotFound(slug)) => {
                    debug!(user = %user_id, program = %slug, "skipping unpublished program");
                    continue;
                }
                Err(e) => return Err(e),
            };
            summaries.push(self.summarize(user_id, &published, Some(enrollment)).await?);
        }
        Ok(Dashboard::from_summaries(summaries))
    }

    /// Wipe every day record of a program and rewind to day 1, atomically.
    ///
    /// Returns the number of day records deleted.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::ProgramNotFound` for unknown or draft programs.
    pub async fn reset_program(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
    ) -> Result<u64, ProgressError> {
        self.published(slug).await?;
        let now = self.clock.now();
        let mut enrollment = self
            .enrollments
            .get_enrollment(user_id, slug)
            .await?
            .unwrap_or_else(|| Enrollment::start(user_id, slug.clone(), now));
        enrollment.reset(now);
        let deleted = self.store.reset_program(&enrollment).await?;
        info!(user = %user_id, program = %slug, deleted, "program reset");
        Ok(deleted)
    }

    /// Remove one day's record. The enrollment is left alone.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::ProgramNotFound` for unknown or draft programs.
    pub async fn clear_day(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
        day: u32,
    ) -> Result<bool, ProgressError> {
        self.published(slug).await?;
        let deleted = self.day_states.delete_day_state(user_id, slug, day).await?;
        debug!(user = %user_id, program = %slug, day, deleted, "day cleared");
        Ok(deleted)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::DayStateNotFound` when the day was never saved.
    pub async fn day_state(
        &self,
        user_id: UserId,
        slug: &ProgramSlug,
        day: u32,
    ) -> Result<DayState, ProgressError> {
        self.published(slug).await?;
        self.day_states
            .get_day_state(user_id, slug, day)
            .await?
            .ok_or(ProgressError::DayStateNotFound(day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use learn_core::model::{DayDraft, EnrollmentStatus};
    use learn_core::time::fixed_now;

    use crate::test_support::{Fixture, USER};

    fn service(fx: &Fixture) -> ProgressService {
        fx.progress()
    }

    #[tokio::test]
    async fn summary_before_start_is_zero() {
        let fx = Fixture::with_program(7).await;
        let summary = service(&fx).summary(USER, &fx.slug).await.unwrap();
        assert!(!summary.started);
        assert_eq!(summary.progress.total, 7);
        assert_eq!(summary.progress.current_day, 1);
        assert_eq!(summary.progress.percent, 0);
        assert_eq!(summary.updated_at, None);
    }

    #[tokio::test]
    async fn set_day_starts_and_clamps() {
        let fx = Fixture::with_program(7).await;
        let svc = service(&fx);
        let enrollment = svc.set_day(USER, &fx.slug, 3).await.unwrap();
        assert_eq!(enrollment.current_day(), 3);

        let summary = svc.summary(USER, &fx.slug).await.unwrap();
        assert!(summary.started);
        assert_eq!((summary.progress.done, summary.progress.percent), (2, 29));

        let enrollment = svc.set_day(USER, &fx.slug, 57).await.unwrap();
        assert_eq!(enrollment.current_day(), 7);
        let enrollment = svc.set_day(USER, &fx.slug, 0).await.unwrap();
        assert_eq!(enrollment.current_day(), 1);
    }

    #[tokio::test]
    async fn draft_program_is_not_found() {
        let fx = Fixture::with_draft_program().await;
        let err = service(&fx).summary(USER, &fx.slug).await.unwrap_err();
        assert!(matches!(err, ProgressError::ProgramNotFound(_)));
    }

    #[tokio::test]
    async fn plan_is_ordered_and_capped() {
        let fx = Fixture::with_program(5).await;
        let svc = service(&fx).with_plan_limit_max(3);
        let plan = svc.plan(&fx.slug, None).await.unwrap();
        let indexes: Vec<_> = plan.iter().map(|p| p.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert_eq!(plan[0].title, "Jour 1");
        assert_eq!(svc.plan(&fx.slug, Some(2)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn pause_requires_enrollment() {
        let fx = Fixture::with_program(3).await;
        let svc = service(&fx);
        assert!(matches!(
            svc.pause(USER, &fx.slug).await,
            Err(ProgressError::NotEnrolled(_))
        ));
        svc.set_day(USER, &fx.slug, 2).await.unwrap();
        let paused = svc.pause(USER, &fx.slug).await.unwrap();
        assert_eq!(paused.status(), EnrollmentStatus::Paused);
        let resumed = svc.resume(USER, &fx.slug).await.unwrap();
        assert_eq!(resumed.status(), EnrollmentStatus::Active);
        assert_eq!(resumed.current_day(), 2);
    }

    #[tokio::test]
    async fn reset_wipes_days_and_rewinds() {
        let fx = Fixture::with_program(3).await;
        let svc = service(&fx);
        svc.set_day(USER, &fx.slug, 3).await.unwrap();
        for day in 1..=2 {
            let state = DayState::from_persisted(
                USER,
                fx.slug.clone(),
                day,
                DayDraft::default(),
                true,
                fixed_now(),
            )
            .unwrap();
            fx.storage.day_states.upsert_day_state(&state).await.unwrap();
        }

        assert_eq!(svc.reset_program(USER, &fx.slug).await.unwrap(), 2);

        let summary = svc.summary(USER, &fx.slug).await.unwrap();
        assert_eq!(summary.progress.current_day, 1);
        assert_eq!(summary.completed_days, 0);
        assert!(matches!(
            svc.day_state(USER, &fx.slug, 1).await,
            Err(ProgressError::DayStateNotFound(1))
        ));
    }

    #[tokio::test]
    async fn clear_day_keeps_pointer() {
        let fx = Fixture::with_program(3).await;
        let svc = service(&fx);
        svc.set_day(USER, &fx.slug, 2).await.unwrap();
        let state =
            DayState::from_persisted(USER, fx.slug.clone(), 1, DayDraft::default(), true, fixed_now())
                .unwrap();
        fx.storage.day_states.upsert_day_state(&state).await.unwrap();

        assert!(svc.clear_day(USER, &fx.slug, 1).await.unwrap());
        assert!(!svc.clear_day(USER, &fx.slug, 1).await.unwrap());
        let summary = svc.summary(USER, &fx.slug).await.unwrap();
        assert_eq!(summary.progress.current_day, 2);
    }

    #[tokio::test]
    async fn dashboard_aggregates_enrollments() {
        let fx = Fixture::with_program(4).await;
        let svc = service(&fx);
        svc.set_day(USER, &fx.slug, 3).await.unwrap();

        let dashboard = svc.dashboard(USER).await.unwrap();
        assert_eq!(dashboard.programs.len(), 1);
        assert_eq!(dashboard.stats.programs, 1);
        assert_eq!(dashboard.stats.in_progress, 1);
        assert_eq!(dashboard.stats.average_percent, 50);

        let empty = svc.dashboard(UserId::new(999)).await.unwrap();
        assert!(empty.programs.is_empty());
    }
}
