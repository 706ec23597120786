use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use learn_core::model::{
    DayDraft, DayState, Enrollment, EnrollmentStatus, JournalSchema, ProgramSlug, QuestionDef,
    UnitId, UnitType, UserId,
};
use learn_core::time::fixed_now;
use services::{
    AppServices, Clock, JournalService, NewUnit, ProgressError, SaveDayRequest, ServiceOptions,
};
use storage::repository::{InMemoryRepository, ProgressStore, Storage, StorageError};

const LEARNER: UserId = UserId::new(42);

fn journal() -> JournalSchema {
    JournalSchema {
        questions: vec![QuestionDef {
            key: "gratitude".into(),
            label: "Pour quoi es-tu reconnaissant ?".into(),
            required: true,
        }],
        ..JournalSchema::default()
    }
}

fn answered() -> DayDraft {
    let mut data = BTreeMap::new();
    data.insert("gratitude".to_string(), "le soleil".to_string());
    DayDraft {
        data,
        practiced: true,
        ..DayDraft::default()
    }
}

async fn seed(services: &AppServices, days: u32) -> (ProgramSlug, Vec<UnitId>) {
    let catalog = services.catalog();
    let program = catalog
        .create_program("Sept jours de gratitude", None)
        .await
        .unwrap();
    let slug = program.slug().clone();
    let mut ids = Vec::new();
    for index in 1..=days {
        let unit = catalog
            .add_unit(
                &slug,
                NewUnit {
                    unit_type: UnitType::Day,
                    unit_index: index,
                    title: format!("Jour {index}"),
                    journal: journal(),
                },
            )
            .await
            .unwrap();
        catalog.publish_unit(unit.id()).await.unwrap();
        ids.push(unit.id());
    }
    catalog.publish_program(&slug).await.unwrap();
    (slug, ids)
}

#[tokio::test]
async fn learner_walks_through_a_program() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()), ServiceOptions::default());
    let (slug, days) = seed(&services, 3).await;
    let progress = services.progress();
    let journal = services.journal();

    progress.set_day(LEARNER, &slug, 1).await.unwrap();
    for (i, unit_id) in days.iter().enumerate() {
        let outcome = journal
            .save_day(
                LEARNER,
                SaveDayRequest {
                    program_slug: slug.clone(),
                    unit_id: *unit_id,
                    draft: answered(),
                    completed: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.day as usize, i + 1);
        assert!(outcome.advanced());
    }

    let summary = progress.summary(LEARNER, &slug).await.unwrap();
    assert_eq!(summary.progress.status, EnrollmentStatus::Completed);
    assert_eq!(summary.progress.percent, 100);
    assert_eq!(summary.completed_days, 3);

    let dashboard = progress.dashboard(LEARNER).await.unwrap();
    assert_eq!(dashboard.stats.completed, 1);

    assert_eq!(progress.reset_program(LEARNER, &slug).await.unwrap(), 3);
    let summary = progress.summary(LEARNER, &slug).await.unwrap();
    assert_eq!(summary.progress.status, EnrollmentStatus::Active);
    assert_eq!((summary.progress.current_day, summary.progress.percent), (1, 0));
}

#[tokio::test]
async fn plan_lists_published_days_only() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()), ServiceOptions::default());
    let (slug, _) = seed(&services, 2).await;
    services
        .catalog()
        .add_unit(
            &slug,
            NewUnit {
                unit_type: UnitType::Day,
                unit_index: 3,
                title: "Brouillon".into(),
                journal: JournalSchema::default(),
            },
        )
        .await
        .unwrap();

    let plan = services.progress().plan(&slug, None).await.unwrap();
    let titles: Vec<_> = plan.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Jour 1", "Jour 2"]);
}

/// Accepts day-only writes but refuses every transactional commit.
#[derive(Clone)]
struct RefusingStore;

#[async_trait]
impl ProgressStore for RefusingStore {
    async fn commit_day(&self, _: &DayState, _: &Enrollment) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }

    async fn reset_program(&self, _: &Enrollment) -> Result<u64, StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }
}

#[tokio::test]
async fn failed_commit_leaves_no_partial_state() {
    let storage = Storage::from_repository(InMemoryRepository::new());
    let services =
        AppServices::from_storage(&storage, Clock::fixed(fixed_now()), ServiceOptions::default());
    let (slug, days) = seed(&services, 2).await;

    let journal = JournalService::new(
        Clock::fixed(fixed_now()),
        Arc::clone(&storage.programs),
        Arc::clone(&storage.units),
        Arc::clone(&storage.enrollments),
        Arc::clone(&storage.day_states),
        Arc::new(RefusingStore),
    );
    let err = journal
        .save_day(
            LEARNER,
            SaveDayRequest {
                program_slug: slug.clone(),
                unit_id: days[0],
                draft: answered(),
                completed: true,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::Storage(_)));

    let progress = services.progress();
    assert!(matches!(
        progress.day_state(LEARNER, &slug, 1).await,
        Err(ProgressError::DayStateNotFound(1))
    ));
    assert!(!progress.summary(LEARNER, &slug).await.unwrap().started);
}
