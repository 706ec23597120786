use chrono::{DateTime, Utc};

use learn_core::model::{DayAdvance, EnrollmentStatus, ProgramSlug, UnitId};
use learn_core::{DashboardStats, ProgressSnapshot};

/// Progress of one learner on one program.
///
/// Presentation-agnostic: the web layer decides key casing and wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSummary {
    pub program_slug: ProgramSlug,
    pub title: String,
    pub progress: ProgressSnapshot,
    /// Whether an enrollment exists.
    pub started: bool,
    /// Number of validated day records within the published range.
    pub completed_days: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One entry of a program outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    pub index: u32,
    pub unit_id: UnitId,
    pub title: String,
}

/// Every enrollment of a member plus the aggregate numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub programs: Vec<ProgramSummary>,
    pub stats: DashboardStats,
}

impl Dashboard {
    #[must_use]
    pub fn from_summaries(programs: Vec<ProgramSummary>) -> Self {
        let stats = DashboardStats::from_snapshots(programs.iter().map(|p| &p.progress));
        Self { programs, stats }
    }
}

/// Result of saving one day's journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySaveOutcome {
    pub day: u32,
    pub completed: bool,
    /// True only for the save that first validated the day.
    pub newly_completed: bool,
    pub advance: DayAdvance,
    pub current_day: u32,
    pub status: EnrollmentStatus,
}

impl DaySaveOutcome {
    #[must_use]
    pub fn advanced(&self) -> bool {
        self.advance.moved()
    }
}
