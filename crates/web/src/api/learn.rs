use std::collections::BTreeMap;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use learn_core::model::{EnrollmentStatus, confirms_reset};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::CurrentUser;
use super::error::ApiError;
use super::parse_slug;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgressAction {
    SetDay,
    Pause,
    Resume,
}

#[derive(Debug, Deserialize)]
pub struct ProgressBody {
    pub slug: String,
    pub action: ProgressAction,
    pub day: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub ok: bool,
    pub current_day: u32,
    pub status: EnrollmentStatus,
}

/// POST /api/learn/progress
pub async fn update_progress(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    body: Result<Json<ProgressBody>, JsonRejection>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let Json(body) = body?;
    let slug = parse_slug(&body.slug)?;
    let progress = state.services.progress();
    let enrollment = match body.action {
        ProgressAction::SetDay => {
            let day = body.day.ok_or(ApiError::BadRequest("Jour manquant."))?;
            progress.set_day(user_id, &slug, day).await?
        }
        ProgressAction::Pause => progress.pause(user_id, &slug).await?,
        ProgressAction::Resume => progress.resume(user_id, &slug).await?,
    };
    Ok(Json(ProgressResponse {
        ok: true,
        current_day: enrollment.current_day(),
        status: enrollment.status(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub slug: String,
    pub day: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStateResponse {
    pub ok: bool,
    pub day: u32,
    pub data: BTreeMap<String, String>,
    pub sliders: BTreeMap<String, f64>,
    pub practiced: bool,
    pub mantra3x: bool,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

/// GET /api/learn/state?slug=&day=N
pub async fn get_day_state(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<DayQuery>, QueryRejection>,
) -> Result<Json<DayStateResponse>, ApiError> {
    let Query(query) = query?;
    let slug = parse_slug(&query.slug)?;
    let day_state = state
        .services
        .progress()
        .day_state(user_id, &slug, query.day)
        .await?;
    Ok(Json(DayStateResponse {
        ok: true,
        day: day_state.day(),
        data: day_state.data().clone(),
        sliders: day_state.sliders().clone(),
        practiced: day_state.practiced(),
        mantra3x: day_state.mantra3x(),
        completed: day_state.completed(),
        updated_at: day_state.updated_at(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub slug: String,
    pub all: Option<String>,
    pub day: Option<u32>,
    /// Typed confirmation keyword; checked when present.
    pub confirm: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
    pub deleted: u64,
}

fn flag_set(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true"))
}

/// DELETE /api/learn/state?slug=&all=1 or ?slug=&day=N
pub async fn delete_state(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Query(query) = query?;
    let slug = parse_slug(&query.slug)?;
    let progress = state.services.progress();

    let deleted = if flag_set(query.all.as_deref()) {
        if let Some(typed) = query.confirm.as_deref() {
            if !confirms_reset(typed) {
                return Err(ApiError::BadRequest(
                    "Tape RECOMMENCER pour confirmer la remise à zéro.",
                ));
            }
        }
        let deleted = progress.reset_program(user_id, &slug).await?;
        info!(user = %user_id, program = %slug, deleted, "reset requested over http");
        deleted
    } else if let Some(day) = query.day {
        u64::from(progress.clear_day(user_id, &slug, day).await?)
    } else {
        return Err(ApiError::BadRequest("Précise all=1 ou day=N."));
    };

    Ok(Json(DeleteResponse { ok: true, deleted }))
}
