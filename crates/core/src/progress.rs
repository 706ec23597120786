//! Progress arithmetic shared by the summary endpoint, the member dashboard
//! and aggregate statistics. Everything here is pure: the same inputs always
//! give the same snapshot.

use crate::model::EnrollmentStatus;

/// Clamp a day pointer into `[1, max(total, 1)]`.
#[must_use]
pub fn clamp_day(day: u32, total: u32) -> u32 {
    day.clamp(1, total.max(1))
}

/// Derived progress for one enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub status: EnrollmentStatus,
    pub current_day: u32,
    pub done: u32,
    pub total: u32,
    pub percent: u32,
}

impl ProgressSnapshot {
    /// Compute `{done, total, percent, current_day}` from the enrollment
    /// status, its raw pointer and the number of published days.
    #[must_use]
    pub fn compute(status: EnrollmentStatus, current_day: u32, total: u32) -> Self {
        let current_day = clamp_day(current_day, total);
        let done = if status == EnrollmentStatus::Completed {
            total
        } else {
            current_day.saturating_sub(1)
        };
        Self {
            status,
            current_day,
            done,
            total,
            percent: percent_of(done, total),
        }
    }

    /// Snapshot for a learner who never started the program.
    #[must_use]
    pub fn not_started(total: u32) -> Self {
        Self::compute(EnrollmentStatus::Active, 1, total)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == EnrollmentStatus::Completed
    }
}

/// `round(done / total * 100)`, half rounding up; 0 for an empty program.
fn percent_of(done: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let done = u64::from(done.min(total));
    let total = u64::from(total);
    let rounded = (done * 200 + total) / (2 * total);
    // rounded <= 100 because done <= total
    u32::try_from(rounded).unwrap_or(100)
}

/// Aggregate view over a member's enrollments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub programs: u32,
    pub completed: u32,
    pub in_progress: u32,
    pub average_percent: u32,
}

impl DashboardStats {
    #[must_use]
    pub fn from_snapshots<'a>(snapshots: impl IntoIterator<Item = &'a ProgressSnapshot>) -> Self {
        let mut stats = Self::default();
        let mut percent_sum: u64 = 0;
        for snapshot in snapshots {
            stats.programs = stats.programs.saturating_add(1);
            if snapshot.is_complete() {
                stats.completed = stats.completed.saturating_add(1);
            } else {
                stats.in_progress = stats.in_progress.saturating_add(1);
            }
            percent_sum += u64::from(snapshot.percent);
        }
        if stats.programs > 0 {
            let n = u64::from(stats.programs);
            let avg = (percent_sum * 2 + n) / (2 * n);
            stats.average_percent = u32::try_from(avg).unwrap_or(100);
        }
        stats
    }
}
