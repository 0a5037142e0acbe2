//! Session lifecycle and turn-resumption API endpoints — the HTTP surface
//! for creating a problem-forging session, streaming its agent turns, and
//! feeding back the user's review decisions at each pause point.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use futures_util::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};

use forge_domain::error::Error;
use forge_domain::phase::SessionStatus;
use forge_domain::state::forge_state::ResearchDirective;

use crate::runtime::{run_turn, TurnEvent, TurnInput};
use crate::state::AppState;

use super::error::{ApiError, ApiResult};

const MIN_PROBLEM_LEN: usize = 10;
const MAX_PROBLEM_LEN: usize = 10_000;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/v1/sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct CreateSessionBody {
    pub problem: String,
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionBody>,
) -> ApiResult<Response> {
    let trimmed = body.problem.trim();
    if trimmed.len() < MIN_PROBLEM_LEN || trimmed.len() > MAX_PROBLEM_LEN {
        return Err(ApiError(Error::Validation {
            field: "problem".to_string(),
            message: format!(
                "problem must be {MIN_PROBLEM_LEN}..{MAX_PROBLEM_LEN} characters after trimming, got {}",
                trimmed.len()
            ),
        }));
    }

    let row = state.sessions.create(trimmed.to_string())?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": row.id, "problem": row.problem, "status": row.status })),
    )
        .into_response())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/v1/sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub status: Option<SessionStatus>,
}

fn default_limit() -> usize {
    50
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Query(q): Query<ListSessionsQuery>,
) -> impl IntoResponse {
    let rows = state.sessions.list(q.limit, q.offset, q.status);
    Json(json!({ "sessions": rows, "count": rows.len() }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/v1/sessions/{id}
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let row = state
        .sessions
        .get(&id)
        .ok_or_else(|| Error::NotFound(format!("session {id}")))?;
    Ok(Json(row).into_response())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/v1/sessions/{id}/cancel
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn cancel_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let row = state
        .sessions
        .get(&id)
        .ok_or_else(|| Error::NotFound(format!("session {id}")))?;
    if matches!(row.status, SessionStatus::Crystallized | SessionStatus::Cancelled) {
        return Err(ApiError(Error::Conflict(format!(
            "session {id} is already {:?} and cannot be cancelled",
            row.status
        ))));
    }

    state.cancel_map.cancel(&id);
    if let Some(live) = state.live_states.write().get_mut(&id) {
        live.cancelled = true;
    }

    let updated = state.sessions.cancel(&id)?.ok_or_else(|| Error::NotFound(format!("session {id}")))?;
    Ok(Json(updated).into_response())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DELETE /api/v1/sessions/{id}
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    state.evict_live_state(&id);
    state.sessions.evict(&id);

    let sessions = state.sessions.clone();
    let purge_id = id.clone();
    tokio::spawn(async move {
        if let Err(e) = sessions.purge(&purge_id) {
            tracing::warn!(session_id = %purge_id, error = %e, "failed to purge session");
        }
    });

    StatusCode::ACCEPTED
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/v1/sessions/{id}/stream
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn stream_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let row = state.sessions.get(&id).ok_or_else(|| Error::NotFound(format!("session {id}")))?;

    let input = TurnInput { session_id: id, user_message: row.problem };
    let rx = run_turn(Arc::new(state), input).await?;
    Ok(sse_response(rx))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/v1/sessions/{id}/user-input
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Applies the user's review decision directly to `ForgeState` (bypassing
/// the model, see `forge_tools::handlers::user_input`), then resumes the
/// turn with the resulting summary as the next user message.
pub async fn submit_user_input(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Response> {
    let permit = state
        .session_locks
        .acquire(&id)
        .await
        .map_err(|_| Error::Conflict(format!("session {id} is busy")))?;

    let mut forge_state = state.ensure_live_state(&id)?;
    let result = forge_tools::dispatch::apply_user_input(&mut forge_state, &state.claims, &id, body);
    if result["status"] == "error" {
        drop(permit);
        return Ok((StatusCode::BAD_REQUEST, Json(result)).into_response());
    }
    state.sessions.commit_snapshot(&id, &forge_state)?;
    state.set_live_state(&id, forge_state);
    drop(permit);

    let summary = result["summary"].as_str().unwrap_or_default().to_string();
    let input = TurnInput { session_id: id, user_message: summary };
    let rx = run_turn(Arc::new(state), input).await?;
    Ok(sse_response(rx))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/v1/sessions/{id}/graph
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn session_graph(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let graph = state.claims.graph(&id);

    let nodes: Vec<Value> = graph
        .claims
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "type": c.status,
                "label": c.claim_text,
                "confidence": c.confidence,
                "round": c.round_created,
            })
        })
        .collect();

    let edges: Vec<Value> = graph
        .edges
        .iter()
        .map(|e| json!({ "source": e.source_claim_id, "target": e.target_claim_id, "type": e.edge_type }))
        .collect();

    Json(json!({ "nodes": nodes, "edges": edges }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/v1/sessions/{id}/research-directive
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct ResearchDirectiveBody {
    pub directive_type: String,
    pub query: String,
    #[serde(default)]
    pub domain: Option<String>,
}

pub async fn enqueue_research_directive(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ResearchDirectiveBody>,
) -> ApiResult<Response> {
    let mut forge_state = state.ensure_live_state(&id)?;
    forge_state.add_research_directive(ResearchDirective {
        directive_type: body.directive_type,
        query: body.query,
        domain: body.domain,
    });
    state.sessions.commit_snapshot(&id, &forge_state)?;
    state.set_live_state(&id, forge_state);
    Ok(Json(json!({ "status": "queued" })).into_response())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SSE plumbing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Wraps each [`TurnEvent`] in the `{type, data}` envelope and sets the
/// anti-buffering headers proxies need to forward chunks immediately.
fn sse_response(rx: tokio::sync::mpsc::Receiver<TurnEvent>) -> Response {
    let stream = make_sse_stream(rx);
    let mut response = Sse::new(stream).keep_alive(KeepAlive::default()).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(HeaderName::from_static("x-accel-buffering"), HeaderValue::from_static("no"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

fn make_sse_stream(
    mut rx: tokio::sync::mpsc::Receiver<TurnEvent>,
) -> impl Stream<Item = Result<Event, std::convert::Infallible>> {
    async_stream::stream! {
        while let Some(event) = rx.recv().await {
            // `Review` carries its own dynamic event name (one of six
            // `review_*`/`knowledge_document` types), which doesn't fit
            // `TurnEvent`'s fixed one-rename-per-variant tagging — build its
            // wire shape directly instead of going through `to_wire_event`.
            if let TurnEvent::Review { event_type, data } = &event {
                let wire = json!({ "type": event_type, "data": data });
                yield Ok(Event::default().event(event_type.as_str()).data(wire.to_string()));
                continue;
            }

            let event_type = match &event {
                TurnEvent::Token { .. } => "token",
                TurnEvent::ToolCall { .. } => "tool_call",
                TurnEvent::ToolResult { .. } => "tool_result",
                TurnEvent::PhaseAdvanced { .. } => "phase_advanced",
                TurnEvent::Review { .. } => unreachable!("handled above"),
                TurnEvent::Paused { .. } => "paused",
                TurnEvent::Done { .. } => "done",
                TurnEvent::Cancelled => "cancelled",
                TurnEvent::Error { .. } => "error",
            };
            let wire = to_wire_event(event_type, &event);
            yield Ok(Event::default().event(event_type).data(wire.to_string()));
        }
    }
}

/// Flattens `TurnEvent`'s `#[serde(tag = "type")]` representation into the
/// `{type, data}` shape the client expects — `type` at the top level, every
/// other field nested under `data`.
fn to_wire_event(event_type: &str, event: &TurnEvent) -> Value {
    let mut value = serde_json::to_value(event).unwrap_or_else(|_| json!({}));
    if let Value::Object(map) = &mut value {
        map.remove("type");
    }
    json!({ "type": event_type, "data": value })
}
