//! HTTP API handlers

pub mod auth;
pub mod error;
pub mod health;
pub mod learn;
pub mod me;
pub mod programs;
pub mod state;

pub use auth::{CurrentUser, USER_HEADER};
pub use error::ApiError;
pub use health::health_routes;
pub use learn::{delete_state, get_day_state, update_progress};
pub use me::my_programs;
pub use programs::{program_plan, program_summary};
pub use state::{queue_draft, save_state};

use learn_core::model::ProgramSlug;

/// Slugs that fail validation cannot name any program.
pub(crate) fn parse_slug(raw: &str) -> Result<ProgramSlug, ApiError> {
    ProgramSlug::parse(raw.trim()).map_err(|_| ApiError::NotFound("Programme introuvable."))
}
