//! SYNTHESIZE-phase falsification/novelty/scoring tool handlers.

use forge_domain::error::tool_error;
use forge_domain::state::claim::ClaimScores;
use forge_domain::state::forge_state::ForgeState;
use serde::Deserialize;
use serde_json::{json, Value};

use forge_sessions::ClaimsStore;

use super::{ok, parse_args};

pub struct InnovationHandlers;

#[derive(Deserialize)]
struct AttemptFalsificationArgs {
    claim_index: usize,
    approach: String,
    result: String,
    falsified: bool,
    #[allow(dead_code)]
    evidence: Vec<String>,
}

#[derive(Deserialize)]
struct CheckNoveltyArgs {
    claim_index: usize,
    #[allow(dead_code)]
    existing_knowledge: String,
    is_novel: bool,
    novelty_explanation: String,
}

#[derive(Deserialize)]
struct ScoreClaimArgs {
    claim_index: usize,
    novelty: f64,
    groundedness: f64,
    falsifiability: f64,
    significance: f64,
    #[allow(dead_code)]
    reasoning: String,
}

impl InnovationHandlers {
    /// Research-first. Records the claim index in `falsification_attempted`
    /// regardless of outcome — the attempt, not the result, satisfies the
    /// scoring gate.
    pub fn attempt_falsification(state: &mut ForgeState, args: Value) -> Value {
        if !state.has_web_search_this_phase() {
            return tool_error("FALSIFICATION_NOT_SEARCHED", "research this phase is required before attempt_falsification");
        }
        let req: AttemptFalsificationArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        state.falsification_attempted.insert(req.claim_index);
        ok(json!({
            "claim_index": req.claim_index,
            "approach": req.approach,
            "result": req.result,
            "falsified": req.falsified,
        }))
    }

    /// Research-first. Records the claim index in `novelty_checked`.
    pub fn check_novelty(state: &mut ForgeState, args: Value) -> Value {
        if !state.has_web_search_this_phase() {
            return tool_error("NOVELTY_NOT_RESEARCHED", "research this phase is required before check_novelty");
        }
        let req: CheckNoveltyArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        state.novelty_checked.insert(req.claim_index);
        ok(json!({
            "claim_index": req.claim_index,
            "is_novel": req.is_novel,
            "novelty_explanation": req.novelty_explanation,
        }))
    }

    /// Requires falsification AND novelty recorded for the claim; writes
    /// scores to the in-round `RoundClaim` and to the durable
    /// `KnowledgeClaim` row.
    pub fn score_claim(state: &mut ForgeState, claims: &ClaimsStore, session_id: &str, args: Value) -> Value {
        let req: ScoreClaimArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if !state.falsification_attempted.contains(&req.claim_index) {
            return tool_error("FALSIFICATION_NOT_SEARCHED", "attempt_falsification must run before score_claim");
        }
        if !state.novelty_checked.contains(&req.claim_index) {
            return tool_error("NOVELTY_NOT_CHECKED", "check_novelty must run before score_claim");
        }
        let Some(round_claim) = state.current_round_claims.get_mut(req.claim_index) else {
            return tool_error("UNGROUNDED_CLAIM", "claim index out of range for this round");
        };

        let scores = ClaimScores {
            novelty: req.novelty,
            groundedness: req.groundedness,
            falsifiability: req.falsifiability,
            significance: req.significance,
        };
        round_claim.scores = Some(scores);
        let claim_id = round_claim.claim_id.clone();

        let _ = claims.update_claim(session_id, &claim_id, |c| c.scores = Some(scores));

        ok(json!({"claim_id": claim_id}))
    }
}
