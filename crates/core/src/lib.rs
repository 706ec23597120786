#![forbid(unsafe_code)]

//! Domain model for multi-day guided programs: catalog units, learner
//! enrollments, per-day journal state and the progress arithmetic shared by
//! every surface that reports advancement.

pub mod error;
pub mod model;
pub mod progress;
pub mod time;

pub use error::Error;
pub use progress::{DashboardStats, ProgressSnapshot, clamp_day};
pub use time::Clock;
