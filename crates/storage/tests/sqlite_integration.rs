use std::collections::BTreeMap;

use chrono::Duration;
use learn_core::model::{
    DayDraft, DayState, Enrollment, EnrollmentStatus, JournalSchema, Program, ProgramId,
    ProgramSlug, QuestionDef, SliderDef, Unit, UnitId, UnitType, UserId,
};
use learn_core::time::fixed_now;
use storage::repository::{
    DayStateRepository, EnrollmentRepository, ProgramRepository, ProgressStore, StorageError,
    UnitRepository,
};
use storage::sqlite::SqliteRepository;

async fn repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn slug() -> ProgramSlug {
    ProgramSlug::parse("sept-jours").unwrap()
}

async fn seed_program(repo: &SqliteRepository) -> ProgramId {
    let program = Program::new(
        ProgramId::new(0),
        slug(),
        "Sept jours",
        Some("Un parcours guidé".into()),
        fixed_now(),
    )
    .unwrap();
    repo.insert_program(&program).await.unwrap()
}

fn journal() -> JournalSchema {
    JournalSchema {
        sliders: vec![SliderDef {
            key: "calme".into(),
            label: "Calme".into(),
            min: 0.0,
            max: 10.0,
        }],
        questions: vec![QuestionDef {
            key: "intention".into(),
            label: "Intention".into(),
            required: true,
        }],
        checks: vec![],
    }
}

fn day_state(day: u32, completed: bool) -> DayState {
    let mut data = BTreeMap::new();
    data.insert("intention".to_string(), "respirer".to_string());
    let mut sliders = BTreeMap::new();
    sliders.insert("calme".to_string(), 7.5);
    DayState::from_persisted(
        UserId::new(9),
        slug(),
        day,
        DayDraft {
            data,
            sliders,
            practiced: true,
            mantra3x: false,
        },
        completed,
        fixed_now(),
    )
    .unwrap()
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = repo("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn program_and_units_round_trip() {
    let repo = repo("memdb_catalog").await;
    let program_id = seed_program(&repo).await;

    let mut fetched = repo.get_program(&slug()).await.unwrap().expect("program");
    assert_eq!(fetched.id(), program_id);
    assert_eq!(fetched.description(), Some("Un parcours guidé"));
    assert!(!fetched.is_published());

    fetched.publish();
    repo.update_program(&fetched).await.unwrap();
    assert!(repo.get_program(&slug()).await.unwrap().unwrap().is_published());

    let day2 = Unit::new(UnitId::new(0), slug(), UnitType::Day, 2, "Jour 2", journal()).unwrap();
    let day1 = Unit::new(UnitId::new(0), slug(), UnitType::Day, 1, "Jour 1", journal()).unwrap();
    let intro = Unit::new(
        UnitId::new(0),
        slug(),
        UnitType::Intro,
        1,
        "Bienvenue",
        JournalSchema::default(),
    )
    .unwrap();
    repo.insert_unit(&day2).await.unwrap();
    let day1_id = repo.insert_unit(&day1).await.unwrap();
    repo.insert_unit(&intro).await.unwrap();

    let units = repo.list_units(&slug()).await.unwrap();
    let order: Vec<_> = units.iter().map(|u| (u.unit_type(), u.unit_index())).collect();
    assert_eq!(
        order,
        vec![(UnitType::Intro, 1), (UnitType::Day, 1), (UnitType::Day, 2)]
    );

    let unit = repo.get_unit(day1_id).await.unwrap().expect("unit");
    assert_eq!(unit.journal(), &journal());
}

#[tokio::test]
async fn duplicate_keys_map_to_conflict() {
    let repo = repo("memdb_conflicts").await;
    seed_program(&repo).await;

    let again = Program::new(ProgramId::new(0), slug(), "Doublon", None, fixed_now()).unwrap();
    assert!(matches!(
        repo.insert_program(&again).await,
        Err(StorageError::Conflict)
    ));

    let unit = Unit::new(UnitId::new(0), slug(), UnitType::Day, 1, "Jour 1", journal()).unwrap();
    repo.insert_unit(&unit).await.unwrap();
    assert!(matches!(
        repo.insert_unit(&unit).await,
        Err(StorageError::Conflict)
    ));
}

#[tokio::test]
async fn commit_day_persists_state_and_enrollment() {
    let repo = repo("memdb_commit_day").await;
    seed_program(&repo).await;

    let mut enrollment = Enrollment::start(UserId::new(9), slug(), fixed_now());
    enrollment.record_completed_day(1, 3, fixed_now() + Duration::minutes(5));
    let state = day_state(1, true);

    repo.commit_day(&state, &enrollment).await.unwrap();

    let stored = repo
        .get_day_state(UserId::new(9), &slug(), 1)
        .await
        .unwrap()
        .expect("day state");
    assert_eq!(stored, state);

    let stored = repo
        .get_enrollment(UserId::new(9), &slug())
        .await
        .unwrap()
        .expect("enrollment");
    assert_eq!(stored.current_day(), 2);
    assert_eq!(stored.status(), EnrollmentStatus::Active);
    assert_eq!(stored.started_at(), fixed_now());
}

#[tokio::test]
async fn reset_program_wipes_days_and_rewinds() {
    let repo = repo("memdb_reset").await;
    seed_program(&repo).await;

    let mut enrollment = Enrollment::start(UserId::new(9), slug(), fixed_now());
    enrollment.set_day(3, 3, fixed_now());
    repo.upsert_enrollment(&enrollment).await.unwrap();
    for day in 1..=2 {
        repo.upsert_day_state(&day_state(day, true)).await.unwrap();
    }

    enrollment.reset(fixed_now());
    let deleted = repo.reset_program(&enrollment).await.unwrap();

    assert_eq!(deleted, 2);
    assert!(repo.list_day_states(UserId::new(9), &slug()).await.unwrap().is_empty());
    let stored = repo.get_enrollment(UserId::new(9), &slug()).await.unwrap().unwrap();
    assert_eq!(stored.current_day(), 1);
}

#[tokio::test]
async fn enrollments_list_most_recent_first() {
    let repo = repo("memdb_enrollment_list").await;
    seed_program(&repo).await;
    let other = Program::new(
        ProgramId::new(0),
        ProgramSlug::parse("souffle").unwrap(),
        "Souffle",
        None,
        fixed_now(),
    )
    .unwrap();
    repo.insert_program(&other).await.unwrap();

    let older = Enrollment::start(UserId::new(9), slug(), fixed_now());
    let newer = Enrollment::start(
        UserId::new(9),
        ProgramSlug::parse("souffle").unwrap(),
        fixed_now() + Duration::days(1),
    );
    repo.upsert_enrollment(&older).await.unwrap();
    repo.upsert_enrollment(&newer).await.unwrap();

    let listed = repo.list_enrollments(UserId::new(9)).await.unwrap();
    let slugs: Vec<_> = listed.iter().map(|e| e.program_slug().as_str()).collect();
    assert_eq!(slugs, vec!["souffle", "sept-jours"]);
    assert!(repo.list_enrollments(UserId::new(1)).await.unwrap().is_empty());
}
