//! The `Session` aggregate root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forge_domain::phase::{Phase, SessionStatus};
use forge_domain::state::forge_state::ForgeState;
use forge_domain::state::snapshot::to_snapshot;
use forge_domain::tool::Message;
use forge_domain::Locale;

/// Cumulative LLM token counters for a session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenCounters {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
}

impl TokenCounters {
    pub fn record(&mut self, usage: &forge_domain::stream::Usage) {
        self.input_tokens += usage.prompt_tokens as u64;
        self.output_tokens += usage.completion_tokens as u64;
    }
}

/// The persisted row for a session: everything that survives a restart
/// except the live `ForgeState`, which is kept as its snapshot form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRow {
    pub id: String,
    pub problem: String,
    pub current_phase: Phase,
    pub current_round: usize,
    pub status: SessionStatus,
    pub locale: Locale,
    pub locale_confidence: f64,
    #[serde(default)]
    pub tokens: TokenCounters,
    /// Opaque LLM message history, replayed into each new turn's context.
    #[serde(default)]
    pub message_history: Vec<Message>,
    /// The last committed `ForgeState` snapshot (§4.2 snapshot codec).
    pub forge_state_snapshot: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SessionRow {
    pub fn new(id: String, problem: String) -> Self {
        let state = ForgeState::default();
        let now = Utc::now();
        Self {
            id,
            problem,
            current_phase: state.current_phase,
            current_round: state.current_round,
            status: SessionStatus::from(state.current_phase),
            locale: state.locale,
            locale_confidence: state.locale_confidence,
            tokens: TokenCounters::default(),
            message_history: Vec::new(),
            forge_state_snapshot: to_snapshot(&state),
            created_at: now,
            resolved_at: None,
        }
    }

    /// Sync the row's denormalized fields from a just-committed `ForgeState`.
    pub fn sync_from_state(&mut self, state: &ForgeState) {
        self.current_phase = state.current_phase;
        self.current_round = state.current_round;
        self.status = SessionStatus::from(state.current_phase);
        self.locale = state.locale;
        self.locale_confidence = state.locale_confidence;
        self.forge_state_snapshot = to_snapshot(state);
    }
}

/// A session as returned over the API: the row plus whatever transient view
/// fields a handler wants to attach (kept separate so `SessionRow` stays the
/// pure durable shape).
pub type Session = SessionRow;
