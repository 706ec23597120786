//! Error responses: `{ "ok": false, "error": "<message>" }`.
//!
//! Messages are shown to learners as-is, so they are written in French.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use learn_core::model::{DayStateError, EnrollmentError};
use serde_json::json;
use services::ProgressError;
use tracing::{error, warn};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    Unauthorized,
    NotFound(&'static str),
    Validation(&'static str),
    /// Detail is logged, never sent.
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Validation(msg) => *msg,
            ApiError::Unauthorized => "Connecte-toi pour continuer.",
            ApiError::Internal(_) => "Une erreur est survenue. Réessaie dans un instant.",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(detail) => error!(%status, %detail, "request failed"),
            other => warn!(%status, error = other.message(), "request rejected"),
        }
        let body = Json(json!({
            "ok": false,
            "error": self.message(),
        }));
        (status, body).into_response()
    }
}

fn day_state_message(err: &DayStateError) -> ApiError {
    match err {
        DayStateError::NotPracticed => {
            ApiError::Validation("Indique que tu as pratiqué avant de valider la journée.")
        }
        DayStateError::MissingAnswer => {
            ApiError::Validation("Réponds à au moins une question avant de valider la journée.")
        }
        DayStateError::InvalidDay => ApiError::BadRequest("Jour invalide."),
        _ => ApiError::Validation("Une des valeurs saisies est invalide."),
    }
}

impl From<ProgressError> for ApiError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::ProgramNotFound(_) => ApiError::NotFound("Programme introuvable."),
            ProgressError::UnitNotFound(_) => ApiError::NotFound("Leçon introuvable."),
            ProgressError::DayStateNotFound(_) => {
                ApiError::NotFound("Aucune saisie enregistrée pour ce jour.")
            }
            ProgressError::NotEnrolled(_) => {
                ApiError::NotFound("Tu n'as pas encore commencé ce programme.")
            }
            ProgressError::DayState(e) => day_state_message(&e),
            ProgressError::Enrollment(EnrollmentError::AlreadyCompleted) => {
                ApiError::Validation("Ce programme est déjà terminé.")
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection, "invalid JSON body");
        ApiError::BadRequest("Requête invalide.")
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!(error = %rejection, "invalid query string");
        ApiError::BadRequest("Paramètres invalides.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use storage::repository::StorageError;

    #[test]
    fn progress_errors_map_to_statuses() {
        let cases = [
            (
                ApiError::from(ProgressError::ProgramNotFound("x".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(ProgressError::DayState(DayStateError::NotPracticed)),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(ProgressError::Enrollment(EnrollmentError::AlreadyCompleted)),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(ProgressError::Storage(StorageError::Connection(
                    "pool closed".into(),
                ))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ApiError::Internal("database is locked".into());
        assert!(!err.message().contains("database"));
    }
}
