use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use learn_core::model::{EnrollmentStatus, UnitId};
use serde::{Deserialize, Serialize};
use services::ProgramSummary;

use super::auth::CurrentUser;
use super::error::ApiError;
use super::parse_slug;
use crate::AppState;

/// Progress fields of one program, shared by the summary and the dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBody {
    pub program_slug: String,
    pub title: String,
    pub total: u32,
    pub current_day: u32,
    pub done: u32,
    pub percent: u32,
    pub status: EnrollmentStatus,
    pub started: bool,
    pub completed_days: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ProgramSummary> for SummaryBody {
    fn from(summary: ProgramSummary) -> Self {
        Self {
            program_slug: summary.program_slug.to_string(),
            title: summary.title,
            total: summary.progress.total,
            current_day: summary.progress.current_day,
            done: summary.progress.done,
            percent: summary.progress.percent,
            status: summary.progress.status,
            started: summary.started,
            completed_days: summary.completed_days,
            updated_at: summary.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub summary: SummaryBody,
}

/// GET /api/programs/:slug/summary
pub async fn program_summary(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let slug = parse_slug(&slug)?;
    let summary = state.services.progress().summary(user_id, &slug).await?;
    Ok(Json(SummaryResponse {
        ok: true,
        summary: summary.into(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItemBody {
    pub index: u32,
    pub unit_id: UnitId,
    pub title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub ok: bool,
    pub program_slug: String,
    pub items: Vec<PlanItemBody>,
}

/// GET /api/programs/:slug/plan?limit=N
///
/// Public outline of the published days.
pub async fn program_plan(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Result<Query<PlanQuery>, QueryRejection>,
) -> Result<Json<PlanResponse>, ApiError> {
    let Query(query) = query?;
    let slug = parse_slug(&slug)?;
    let items = state
        .services
        .progress()
        .plan(&slug, query.limit)
        .await?
        .into_iter()
        .map(|item| PlanItemBody {
            index: item.index,
            unit_id: item.unit_id,
            title: item.title,
        })
        .collect();
    Ok(Json(PlanResponse {
        ok: true,
        program_slug: slug.to_string(),
        items,
    }))
}
