mod autosave;
mod journal;
mod queries;
mod service;
mod view;

// Public API of the learner progress subsystem.
pub use crate::error::ProgressError;
pub use autosave::{AutosaveRequest, Autosaver, DEFAULT_AUTOSAVE_DELAY};
pub use journal::{JournalService, SaveDayRequest};
pub use service::{DEFAULT_PLAN_LIMIT_MAX, ProgressService};
pub use view::{Dashboard, DaySaveOutcome, PlanItem, ProgramSummary};
