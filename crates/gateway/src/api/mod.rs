pub mod error;
pub mod health;
pub mod sessions;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router: operational endpoints plus the session
/// lifecycle surface. No public/protected split — there is no auth layer
/// (see DESIGN.md's open-question decisions for why).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/v1/models/readiness", get(health::models_readiness))
        .route("/api/v1/sessions", post(sessions::create_session).get(sessions::list_sessions))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/api/v1/sessions/:id/cancel", post(sessions::cancel_session))
        .route("/api/v1/sessions/:id/stream", get(sessions::stream_session))
        .route("/api/v1/sessions/:id/user-input", post(sessions::submit_user_input))
        .route("/api/v1/sessions/:id/graph", get(sessions::session_graph))
        .route(
            "/api/v1/sessions/:id/research-directive",
            post(sessions::enqueue_research_directive),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
