use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use learn_core::model::{DayDraft, EnrollmentStatus, UnitId};
use serde::{Deserialize, Serialize};
use services::{AutosaveRequest, SaveDayRequest};

use super::auth::CurrentUser;
use super::error::ApiError;
use super::parse_slug;
use crate::AppState;

/// Body of `PUT /api/state` and `PUT /api/state/draft`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStateBody {
    pub program_slug: String,
    pub unit_id: UnitId,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(default)]
    pub sliders: BTreeMap<String, f64>,
    #[serde(default)]
    pub practiced: bool,
    #[serde(default)]
    pub mantra3x: bool,
    #[serde(default)]
    pub completed: bool,
}

impl SaveStateBody {
    fn into_request(self) -> Result<SaveDayRequest, ApiError> {
        Ok(SaveDayRequest {
            program_slug: parse_slug(&self.program_slug)?,
            unit_id: self.unit_id,
            draft: DayDraft {
                data: self.data,
                sliders: self.sliders,
                practiced: self.practiced,
                mantra3x: self.mantra3x,
            },
            completed: self.completed,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentBody {
    pub current_day: u32,
    pub status: EnrollmentStatus,
}

#[derive(Debug, Serialize)]
pub struct SaveStateResponse {
    pub ok: bool,
    pub day: u32,
    pub completed: bool,
    pub advanced: bool,
    pub enrollment: EnrollmentBody,
}

/// PUT /api/state
///
/// Upserts the day's journal; `completed: true` validates the day and may
/// advance the enrollment. A draft still queued for the same day is dropped.
pub async fn save_state(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    body: Result<Json<SaveStateBody>, JsonRejection>,
) -> Result<Json<SaveStateResponse>, ApiError> {
    let Json(body) = body?;
    let request = body.into_request()?;
    state.services.autosaver().cancel(user_id, &request);
    let outcome = state.services.journal().save_day(user_id, request).await?;
    Ok(Json(SaveStateResponse {
        ok: true,
        day: outcome.day,
        completed: outcome.completed,
        advanced: outcome.advanced(),
        enrollment: EnrollmentBody {
            current_day: outcome.current_day,
            status: outcome.status,
        },
    }))
}

#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub ok: bool,
    pub queued: bool,
}

/// PUT /api/state/draft
///
/// Debounced variant for keystroke-level edits: the draft is written once
/// the learner stops typing. Validation is never queued.
pub async fn queue_draft(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    body: Result<Json<SaveStateBody>, JsonRejection>,
) -> Result<(StatusCode, Json<QueuedResponse>), ApiError> {
    let Json(body) = body?;
    let mut request = body.into_request()?;
    request.completed = false;
    state.services.autosaver().schedule(AutosaveRequest {
        user_id,
        save: request,
    });
    Ok((
        StatusCode::ACCEPTED,
        Json(QueuedResponse {
            ok: true,
            queued: true,
        }),
    ))
}
