//! HTTP JSON API over the learner progress services.
//!
//! Authentication happens upstream; the caller's identity arrives in the
//! `x-user-id` header.

#![forbid(unsafe_code)]

use axum::Router;
use services::AppServices;
use tower_http::trace::TraceLayer;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
}

impl AppState {
    #[must_use]
    pub fn new(services: AppServices) -> Self {
        Self { services }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    let learner = Router::new()
        .route("/api/programs/:slug/summary", get(api::program_summary))
        .route("/api/programs/:slug/plan", get(api::program_plan))
        .route("/api/state", put(api::save_state))
        .route("/api/state/draft", put(api::queue_draft))
        .route("/api/learn/progress", post(api::update_progress))
        .route(
            "/api/learn/state",
            get(api::get_day_state).delete(api::delete_state),
        )
        .route("/api/me/programs", get(api::my_programs));

    Router::new()
        .merge(learner)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
