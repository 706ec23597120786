use thiserror::Error;

use crate::model::{DayStateError, EnrollmentError, ProgramError, SlugError, UnitError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error(transparent)]
    Enrollment(#[from] EnrollmentError),
    #[error(transparent)]
    DayState(#[from] DayStateError),
}
