//! Enforcement predicates: pure functions from a [`ForgeState`] (and
//! sometimes a call argument) to either `None` (pass) or `Some(envelope)`
//! (the tool-result error the model sees). None of these mutate state —
//! callers must not apply a handler's mutation when a gate fails.

use serde_json::Value;

use crate::error::tool_error;
use crate::state::claim::Verdict;
use crate::state::forge_state::{ForgeState, MAX_CLAIMS_PER_ROUND};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Phase-transition gates
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn decompose_to_explore(state: &ForgeState) -> Option<Value> {
    if state.fundamentals.is_empty() {
        return Some(tool_error("DECOMPOSE_INCOMPLETE", "no fundamentals decomposed"));
    }
    if !state.state_of_art_researched {
        return Some(tool_error(
            "STATE_OF_ART_NOT_RESEARCHED",
            "call map_state_of_art before leaving DECOMPOSE",
        ));
    }
    if state.assumptions.len() < 3 {
        return Some(tool_error("DECOMPOSE_INCOMPLETE", "fewer than 3 assumptions recorded"));
    }
    if state.reframings.len() < 3 {
        return Some(tool_error("DECOMPOSE_INCOMPLETE", "fewer than 3 reframings proposed"));
    }
    if state.selected_reframings().is_empty() {
        return Some(tool_error("DECOMPOSE_INCOMPLETE", "no reframing has been user-selected"));
    }
    None
}

pub fn explore_to_synthesize(state: &ForgeState) -> Option<Value> {
    if state.morphological_box.is_none() {
        return Some(tool_error("DECOMPOSE_INCOMPLETE", "no morphological box built"));
    }
    if state.cross_domain_search_count < 2 {
        return Some(tool_error(
            "CROSS_DOMAIN_NOT_SEARCHED",
            "fewer than 2 cross-domain searches performed",
        ));
    }
    if state.contradictions.is_empty() {
        return Some(tool_error("DECOMPOSE_INCOMPLETE", "no contradictions identified"));
    }
    if state.resonant_analogies().is_empty() {
        return Some(tool_error("DECOMPOSE_INCOMPLETE", "no cross-domain analogy resonated"));
    }
    None
}

pub fn synthesize_to_validate(state: &ForgeState) -> Option<Value> {
    if !state.all_claims_have_antithesis() {
        return Some(tool_error("ANTITHESIS_MISSING", "not every claim this round has an antithesis"));
    }
    None
}

/// Gate for re-entering SYNTHESIZE from BUILD on round ≥ 1 (§4.3).
pub fn build_to_synthesize(state: &ForgeState) -> Option<Value> {
    if state.max_rounds_reached() {
        return Some(tool_error("MAX_ROUNDS_EXCEEDED", "session has reached its maximum round count"));
    }
    if !state.previous_claims_referenced {
        return Some(tool_error("NOT_CUMULATIVE", "new round must reference claims from a prior round"));
    }
    if !state.negative_knowledge_consulted {
        return Some(tool_error(
            "NEGATIVE_KNOWLEDGE_MISSING",
            "call get_negative_knowledge before proposing a new thesis this round",
        ));
    }
    None
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Per-call gates
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn claim_limit(state: &ForgeState) -> Option<Value> {
    if state.claims_in_round() >= MAX_CLAIMS_PER_ROUND {
        return Some(tool_error(
            "CLAIM_LIMIT_EXCEEDED",
            format!("at most {MAX_CLAIMS_PER_ROUND} claims are allowed per round"),
        ));
    }
    None
}

pub fn antithesis_first(state: &ForgeState, claim_index: usize) -> Option<Value> {
    if !state.antitheses_searched.contains(&claim_index) {
        return Some(tool_error(
            "ANTITHESIS_NOT_SEARCHED",
            "find_antithesis must run for this claim before create_synthesis",
        ));
    }
    None
}

/// `map_state_of_art`, `search_cross_domain`, `find_antithesis`,
/// `attempt_falsification`, and `check_novelty` all require research —
/// either a direct web search this phase, or an equivalent delegated
/// research call (the runner records delegated research the same way).
pub fn research_first(state: &ForgeState, code: &'static str) -> Option<Value> {
    if !state.has_web_search_this_phase() {
        return Some(tool_error(code, "research this phase is required before this call"));
    }
    None
}

pub fn falsification_searched(state: &ForgeState, claim_index: usize) -> Option<Value> {
    if !state.falsification_attempted.contains(&claim_index) {
        return Some(tool_error(
            "FALSIFICATION_NOT_SEARCHED",
            "attempt_falsification must run for this claim before scoring it",
        ));
    }
    None
}

pub fn novelty_checked(state: &ForgeState, claim_index: usize) -> Option<Value> {
    if !state.novelty_checked.contains(&claim_index) {
        return Some(tool_error(
            "NOVELTY_NOT_CHECKED",
            "check_novelty must run for this claim before scoring it",
        ));
    }
    None
}

/// Requires both falsification and novelty to be recorded for a claim
/// before `score_claim` may write scores.
pub fn scoring_gate(state: &ForgeState, claim_index: usize) -> Option<Value> {
    falsification_searched(state, claim_index).or_else(|| novelty_checked(state, claim_index))
}

/// Phases 1–5 must update the working document before the phase
/// completes; CRYSTALLIZE is exempt (its own document write is the
/// phase's output).
pub fn working_document_gate(state: &ForgeState) -> Option<Value> {
    if state.current_phase.requires_document_gate() && !state.document_updated_this_phase {
        return Some(tool_error(
            "DECOMPOSE_INCOMPLETE",
            "update_working_document must run before this phase completes",
        ));
    }
    None
}

pub fn graph_addition_gate(state: &ForgeState, claim_index: usize, verdict: Verdict) -> Option<Value> {
    if claim_index >= state.current_round_claims.len() {
        return Some(tool_error("UNGROUNDED_CLAIM", "claim index out of range for this round"));
    }
    if !matches!(verdict, Verdict::Accept | Verdict::Qualify | Verdict::Merge) {
        return Some(tool_error("INVALID_VERDICT", "verdict must be accept, qualify, or merge"));
    }
    None
}
