//! Shared error types for the services crate.

use thiserror::Error;

use learn_core::model::{
    DayStateError, EnrollmentError, ProgramError, SlugError, UnitError, UnitId, UnitType,
};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("program not found: {0}")]
    ProgramNotFound(String),
    #[error("unit not found: {0}")]
    UnitNotFound(UnitId),
    #[error("a {unit_type} unit with index {index} already exists")]
    DuplicateUnit { unit_type: UnitType, index: u32 },
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the learner progress services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("program not found: {0}")]
    ProgramNotFound(String),
    #[error("unit not found: {0}")]
    UnitNotFound(UnitId),
    #[error("no journal entry for day {0}")]
    DayStateNotFound(u32),
    #[error("no enrollment for program {0}")]
    NotEnrolled(String),
    #[error(transparent)]
    DayState(#[from] DayStateError),
    #[error(transparent)]
    Enrollment(#[from] EnrollmentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
