use crate::handlers::{self, AppState};
use crate::intake_handler;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// Intake and admin endpoints, without middleware.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Intake form sessions
        .route("/api/v1/intake", post(intake_handler::create_intake))
        .route("/api/v1/intake/:id", get(intake_handler::get_intake))
        .route("/api/v1/intake/:id/fields", put(intake_handler::update_fields))
        .route(
            "/api/v1/intake/:id/goal-mode",
            post(intake_handler::set_goal_mode),
        )
        .route("/api/v1/intake/:id/next", post(intake_handler::next_step))
        .route(
            "/api/v1/intake/:id/previous",
            post(intake_handler::previous_step),
        )
        .route("/api/v1/intake/:id/submit", post(intake_handler::submit_intake))
        // Response browser
        .route("/api/v1/responses", get(handlers::list_responses))
        .route(
            "/api/v1/responses/refresh",
            post(handlers::refresh_responses),
        )
        .route("/api/v1/responses/:id", get(handlers::get_response))
}

/// Health check plus every API route, bound to the given state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api_routes())
        .with_state(state)
}
