use serde::Serialize;

/// Structured trace events emitted across all forge crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionResolved {
        session_key: String,
        session_id: String,
        is_new: bool,
    },
    SessionReset {
        session_key: String,
        old_session_id: String,
        new_session_id: String,
        reason: String,
    },
    PhaseTransition {
        session_id: String,
        from: String,
        to: String,
        round: usize,
    },
    EnforcementRejected {
        session_id: String,
        phase: String,
        code: String,
        message: String,
    },
    ToolDispatched {
        session_id: String,
        tool: String,
        duration_ms: u64,
        ok: bool,
    },
    ResearchCallCompleted {
        session_id: String,
        queries: usize,
        sources_found: usize,
        duration_ms: u64,
    },
    LlmRequest {
        provider: String,
        model: String,
        role: String,
        streaming: bool,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    LlmFallback {
        from_provider: String,
        from_model: String,
        to_provider: String,
        to_model: String,
        reason: String,
    },
    CompactionRun {
        session_id: String,
        turns_before: usize,
        turns_after: usize,
    },
    SessionCancelled {
        session_id: String,
        phase: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "forge_event");
    }
}
