#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod progress;

#[cfg(test)]
pub(crate) mod test_support;

pub use learn_core::Clock;

pub use app_services::{AppServices, ServiceOptions};
pub use catalog_service::{CatalogService, NewUnit};
pub use error::{AppServicesError, CatalogError, ProgressError};
pub use progress::{
    AutosaveRequest, Autosaver, Dashboard, DaySaveOutcome, JournalService, PlanItem,
    ProgramSummary, ProgressService, SaveDayRequest,
};
