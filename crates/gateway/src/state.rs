use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use forge_domain::config::Config;
use forge_domain::error::Result;
use forge_domain::state::forge_state::ForgeState;
use forge_providers::ProviderRegistry;
use forge_sessions::{ClaimsStore, SessionStore};
use forge_tools::ResearchSubAgent;

use crate::runtime::cancel::CancelMap;
use crate::runtime::session_lock::SessionLockMap;
use crate::runtime::translate::Translator;

/// Shared application state passed to every API handler and the runner.
///
/// Fields are grouped by concern:
/// - **Core services** — config, LLM providers
/// - **Durable stores** — sessions, claim graphs
/// - **Live state** — the in-memory `session_id → ForgeState` map
/// - **Concurrency** — per-session run lock, cancellation
#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub providers: Arc<ProviderRegistry>,

    // ── Durable stores ──────────────────────────────────────────────────
    pub sessions: Arc<SessionStore>,
    pub claims: Arc<ClaimsStore>,

    // ── Live ForgeState, one entry per session with an in-memory view ──
    pub live_states: Arc<RwLock<HashMap<String, ForgeState>>>,

    // ── Concurrency ─────────────────────────────────────────────────────
    pub session_locks: Arc<SessionLockMap>,
    pub cancel_map: Arc<CancelMap>,

    // ── Review-event translation ─────────────────────────────────────────
    pub translator: Arc<dyn Translator>,
}

impl AppState {
    /// Build a research sub-agent for the "research" role, or `None` if no
    /// provider is registered for it — `forge_tools::dispatch` degrades the
    /// `research` tool to `UNKNOWN_TOOL` in that case rather than panicking.
    pub fn research_agent(&self) -> Option<ResearchSubAgent> {
        let provider = self.providers.for_role("research")?;
        let model = self.providers.model_for_role("research").map(|s| {
            s.split('/').nth(1).unwrap_or(s).to_string()
        });
        Some(ResearchSubAgent::new(provider, model))
    }

    /// The live `ForgeState` for a session, restoring it from the last
    /// committed snapshot on first access after a restart.
    pub fn ensure_live_state(&self, session_id: &str) -> Result<ForgeState> {
        if let Some(state) = self.live_states.read().get(session_id) {
            return Ok(state.clone());
        }
        let restored = self
            .sessions
            .restore_forge_state(session_id)?
            .unwrap_or_default();
        self.live_states.write().insert(session_id.to_string(), restored.clone());
        Ok(restored)
    }

    pub fn set_live_state(&self, session_id: &str, state: ForgeState) {
        self.live_states.write().insert(session_id.to_string(), state);
    }

    pub fn evict_live_state(&self, session_id: &str) {
        self.live_states.write().remove(session_id);
    }
}
