use std::collections::BTreeMap;

use learn_core::model::{
    DayDraft, DayState, Enrollment, EnrollmentStatus, JournalSchema, Program, ProgramId,
    ProgramSlug, PublishStatus, Unit, UnitId, UnitType, UserId,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps driver errors, surfacing unique-key violations as `Conflict`.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn i64_from_u64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_i64(user_id: UserId) -> Result<i64, StorageError> {
    i64_from_u64("user_id", user_id.value())
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

pub(crate) fn from_json<T: DeserializeOwned>(field: &'static str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw)
        .map_err(|e| StorageError::Serialization(format!("invalid {field} json: {e}")))
}

fn slug_col(row: &SqliteRow, column: &str) -> Result<ProgramSlug, StorageError> {
    let raw: String = row.try_get(column).map_err(ser)?;
    ProgramSlug::parse(raw).map_err(ser)
}

fn bool_col(row: &SqliteRow, column: &str) -> Result<bool, StorageError> {
    let raw: i64 = row.try_get(column).map_err(ser)?;
    Ok(raw != 0)
}

pub(crate) fn map_program_row(row: &SqliteRow) -> Result<Program, StorageError> {
    let id = ProgramId::new(u64_from_i64("id", row.try_get("id").map_err(ser)?)?);
    let slug = slug_col(row, "slug")?;
    let title: String = row.try_get("title").map_err(ser)?;
    let description: Option<String> = row.try_get("description").map_err(ser)?;
    let status: String = row.try_get("status").map_err(ser)?;
    let status = PublishStatus::parse(&status).map_err(ser)?;
    let created_at = row.try_get("created_at").map_err(ser)?;

    Program::from_persisted(id, slug, title, description, status, created_at).map_err(ser)
}

pub(crate) fn map_unit_row(row: &SqliteRow) -> Result<Unit, StorageError> {
    let id = UnitId::new(u64_from_i64("id", row.try_get("id").map_err(ser)?)?);
    let slug = slug_col(row, "program_slug")?;
    let unit_type: String = row.try_get("unit_type").map_err(ser)?;
    let unit_type = UnitType::parse(&unit_type).map_err(ser)?;
    let unit_index = u32_from_i64("unit_index", row.try_get("unit_index").map_err(ser)?)?;
    let title: String = row.try_get("title").map_err(ser)?;
    let journal: String = row.try_get("journal").map_err(ser)?;
    let journal: JournalSchema = from_json("journal", &journal)?;
    let status: String = row.try_get("status").map_err(ser)?;
    let status = PublishStatus::parse(&status).map_err(ser)?;

    Unit::from_persisted(id, slug, unit_type, unit_index, title, journal, status).map_err(ser)
}

pub(crate) fn map_enrollment_row(row: &SqliteRow) -> Result<Enrollment, StorageError> {
    let user_id = UserId::new(u64_from_i64("user_id", row.try_get("user_id").map_err(ser)?)?);
    let slug = slug_col(row, "program_slug")?;
    let status: String = row.try_get("status").map_err(ser)?;
    let status = EnrollmentStatus::parse(&status).map_err(ser)?;
    let current_day = u32_from_i64("current_day", row.try_get("current_day").map_err(ser)?)?;
    let started_at = row.try_get("started_at").map_err(ser)?;
    let updated_at = row.try_get("updated_at").map_err(ser)?;

    Enrollment::from_persisted(user_id, slug, status, current_day, started_at, updated_at)
        .map_err(ser)
}

pub(crate) fn map_day_state_row(row: &SqliteRow) -> Result<DayState, StorageError> {
    let user_id = UserId::new(u64_from_i64("user_id", row.try_get("user_id").map_err(ser)?)?);
    let slug = slug_col(row, "program_slug")?;
    let day = u32_from_i64("day", row.try_get("day").map_err(ser)?)?;
    let data: String = row.try_get("data").map_err(ser)?;
    let sliders: String = row.try_get("sliders").map_err(ser)?;
    let draft = DayDraft {
        data: from_json::<BTreeMap<String, String>>("data", &data)?,
        sliders: from_json::<BTreeMap<String, f64>>("sliders", &sliders)?,
        practiced: bool_col(row, "practiced")?,
        mantra3x: bool_col(row, "mantra3x")?,
    };
    let completed = bool_col(row, "completed")?;
    let updated_at = row.try_get("updated_at").map_err(ser)?;

    DayState::from_persisted(user_id, slug, day, draft, completed, updated_at).map_err(ser)
}
