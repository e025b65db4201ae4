pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/star-guide", get(handlers::handle_star_guide))
        // Sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        // Step 1: intake
        .route(
            "/api/v1/sessions/:id/intake",
            post(handlers::handle_submit_intake),
        )
        .route(
            "/api/v1/sessions/:id/intake/confirm",
            post(handlers::handle_confirm_intake),
        )
        // Step 2: questions and answers
        .route(
            "/api/v1/sessions/:id/questions",
            post(handlers::handle_generate_questions),
        )
        .route(
            "/api/v1/sessions/:id/answers/confirm",
            post(handlers::handle_confirm_answers),
        )
        .route(
            "/api/v1/sessions/:id/answers/:index",
            put(handlers::handle_record_answer),
        )
        // Step 3: feedback
        .route(
            "/api/v1/sessions/:id/feedback",
            post(handlers::handle_run_feedback),
        )
        // Step 4: summary
        .route(
            "/api/v1/sessions/:id/summary",
            get(handlers::handle_get_summary),
        )
        .route(
            "/api/v1/sessions/:id/report",
            get(handlers::handle_download_report),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
