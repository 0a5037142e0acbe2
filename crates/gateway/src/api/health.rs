//! Operational endpoints: liveness and provider readiness.

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// `GET /healthz` — plain liveness probe. No dependency checks: a process
/// that can answer this at all is alive, regardless of provider or store
/// health.
pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `GET /v1/models/readiness` — reports which LLM providers initialized
/// successfully, which failed (and why), and the configured startup policy,
/// so an operator can diagnose a missing API key without scraping logs.
pub async fn models_readiness(State(state): State<AppState>) -> impl IntoResponse {
    let init_errors: Vec<_> = state
        .providers
        .init_errors()
        .iter()
        .map(|e| json!({ "provider_id": e.provider_id, "kind": e.kind, "error": e.error }))
        .collect();

    Json(json!({
        "ready": !state.providers.is_empty(),
        "providers": state.providers.list_providers(),
        "roles": state.providers.list_roles(),
        "init_errors": init_errors,
        "startup_policy": format!("{:?}", state.config.llm.startup_policy),
    }))
}
