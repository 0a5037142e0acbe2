//! Name → handler dispatch table. Unknown tool names return `UNKNOWN_TOOL`
//! rather than panicking — a model hallucinating a tool name is a normal
//! failure mode, not a bug.

use serde_json::{json, Value};

use forge_domain::error::tool_error;
use forge_domain::state::forge_state::{ForgeState, ResearchEntry};

use forge_sessions::ClaimsStore;

use crate::handlers::build::BuildHandlers;
use crate::handlers::crystallize::CrystallizeHandlers;
use crate::handlers::decompose::DecomposeHandlers;
use crate::handlers::explore::ExploreHandlers;
use crate::handlers::generation::GenerationHandlers;
use crate::handlers::innovation::InnovationHandlers;
use crate::handlers::interaction::InteractionHandlers;
use crate::handlers::memory::MemoryHandlers;
use crate::handlers::validate::ValidateHandlers;
use crate::handlers::ok;
use crate::research_agent::{ResearchPurpose, ResearchSubAgent};

/// Dispatch one tool call by name. `research_agent` is `None` when no
/// provider is configured for delegated research; the `research` tool then
/// degrades to `UNKNOWN_TOOL` rather than panicking.
pub async fn dispatch(
    name: &str,
    args: Value,
    state: &mut ForgeState,
    claims: &ClaimsStore,
    session_id: &str,
    research_agent: Option<&ResearchSubAgent>,
) -> Value {
    match name {
        "decompose_to_fundamentals" => DecomposeHandlers::decompose_to_fundamentals(state, args),
        "map_state_of_art" => DecomposeHandlers::map_state_of_art(state, args),
        "extract_assumptions" => DecomposeHandlers::extract_assumptions(state, args),
        "reframe_problem" => DecomposeHandlers::reframe_problem(state, args),

        "build_morphological_box" => ExploreHandlers::build_morphological_box(state, args),
        "search_cross_domain" => ExploreHandlers::search_cross_domain(state, args),
        "identify_contradictions" => ExploreHandlers::identify_contradictions(state, args),

        "state_thesis" => GenerationHandlers::state_thesis(state, args),
        "find_antithesis" => GenerationHandlers::find_antithesis(state, args),
        "create_synthesis" => GenerationHandlers::create_synthesis(state, claims, session_id, args),

        "attempt_falsification" => InnovationHandlers::attempt_falsification(state, args),
        "check_novelty" => InnovationHandlers::check_novelty(state, args),
        "score_claim" => InnovationHandlers::score_claim(state, claims, session_id, args),

        "add_to_knowledge_graph" => ValidateHandlers::add_to_knowledge_graph(state, claims, session_id, args),
        "analyze_gaps" => ValidateHandlers::analyze_gaps(state, args),
        "get_negative_knowledge" => ValidateHandlers::get_negative_knowledge(state, args),

        "generate_knowledge_document" => CrystallizeHandlers::generate_knowledge_document(state, args),

        "ask_user" => InteractionHandlers::ask_user(state, args),
        "present_round" => InteractionHandlers::present_round(state, args),
        "generate_final_spec" => InteractionHandlers::generate_final_spec(state, args),

        "get_session_status" => MemoryHandlers::get_session_status(state, args),
        "submit_user_insight" => MemoryHandlers::submit_user_insight(state, claims, session_id, args),
        "recall_phase_context" => MemoryHandlers::recall_phase_context(state, args),
        "search_research_archive" => MemoryHandlers::search_research_archive(state, args),
        "update_working_document" => MemoryHandlers::update_working_document(state, args),
        "read_working_document" => MemoryHandlers::read_working_document(state, args),

        "research" => dispatch_research(state, research_agent, args).await,

        other => tool_error("UNKNOWN_TOOL", format!("no handler registered for tool '{other}'")),
    }
}

/// Advances BUILD → SYNTHESIZE. Not reachable through the model's own tool
/// calls (there's no BUILD-phase tool schema); the runner calls this
/// directly when it observes the phase has completed.
pub fn advance_build_round(state: &mut ForgeState) -> Value {
    BuildHandlers::advance_round(state)
}

/// Applies a `POST /user-input` body directly to `ForgeState`, bypassing
/// the model. Not reachable through `dispatch` by name — the API layer
/// calls this after a pause, then resumes the turn with the returned
/// summary as the next user message.
pub fn apply_user_input(state: &mut ForgeState, claims: &ClaimsStore, session_id: &str, args: Value) -> Value {
    crate::handlers::user_input::UserInputHandlers::apply(state, claims, session_id, args)
}

async fn dispatch_research(state: &mut ForgeState, research_agent: Option<&ResearchSubAgent>, args: Value) -> Value {
    #[derive(serde::Deserialize)]
    struct ResearchArgs {
        query: String,
        purpose: String,
        #[serde(default)]
        instructions: Option<String>,
        #[serde(default)]
        max_results: Option<usize>,
    }

    let Some(agent) = research_agent else {
        return tool_error("UNKNOWN_TOOL", "no research sub-agent is configured for this session");
    };
    let req: ResearchArgs = match serde_json::from_value(args) {
        Ok(r) => r,
        Err(e) => return tool_error("VALIDATION_ERROR", format!("invalid arguments: {e}")),
    };
    let Some(purpose) = ResearchPurpose::parse(&req.purpose) else {
        return tool_error("VALIDATION_ERROR", format!("unknown research purpose '{}'", req.purpose));
    };
    let max_results = req.max_results.unwrap_or(10).min(10);

    let result = agent.run(&req.query, purpose, req.instructions.as_deref()).await;

    state.record_web_search(req.query.clone(), result.summary.clone());
    state.research_archive.push(ResearchEntry {
        query: req.query.clone(),
        purpose: purpose.as_str().to_string(),
        phase: state.current_phase,
        summary: result.summary.clone(),
        sources: result.sources.clone(),
    });
    state.research_tokens_used += result.haiku_tokens;

    ok(json!({
        "summary": result.summary,
        "sources": result.sources.into_iter().take(max_results).collect::<Vec<_>>(),
        "result_count": result.result_count,
        "empty": result.empty,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_tool_name_returns_unknown_tool_code() {
        let mut state = ForgeState::default();
        let dir = tempfile::tempdir().unwrap();
        let claims = ClaimsStore::new(dir.path()).unwrap();
        let result = dispatch("not_a_real_tool", json!({}), &mut state, &claims, "s1", None).await;
        assert_eq!(result["error_code"], "UNKNOWN_TOOL");
    }

    #[tokio::test]
    async fn research_without_agent_is_unknown_tool() {
        let mut state = ForgeState::default();
        let dir = tempfile::tempdir().unwrap();
        let claims = ClaimsStore::new(dir.path()).unwrap();
        let result = dispatch(
            "research",
            json!({"query": "q", "purpose": "state_of_art"}),
            &mut state,
            &claims,
            "s1",
            None,
        )
        .await;
        assert_eq!(result["error_code"], "UNKNOWN_TOOL");
    }

    #[tokio::test]
    async fn get_session_status_routes_through_dispatch() {
        let mut state = ForgeState::default();
        let dir = tempfile::tempdir().unwrap();
        let claims = ClaimsStore::new(dir.path()).unwrap();
        let result = dispatch("get_session_status", json!({}), &mut state, &claims, "s1", None).await;
        assert_eq!(result["phase"], "decompose");
    }
}
