use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::auth::CurrentUser;
use super::error::ApiError;
use super::programs::SummaryBody;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsBody {
    pub programs: u32,
    pub completed: u32,
    pub in_progress: u32,
    pub average_percent: u32,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub ok: bool,
    pub programs: Vec<SummaryBody>,
    pub stats: StatsBody,
}

/// GET /api/me/programs
///
/// Member dashboard: every started program, most recent first.
pub async fn my_programs(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    let dashboard = state.services.progress().dashboard(user_id).await?;
    let stats = dashboard.stats;
    Ok(Json(DashboardResponse {
        ok: true,
        programs: dashboard.programs.into_iter().map(SummaryBody::from).collect(),
        stats: StatsBody {
            programs: stats.programs,
            completed: stats.completed,
            in_progress: stats.in_progress,
            average_percent: stats.average_percent,
        },
    }))
}
