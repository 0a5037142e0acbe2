//! SYNTHESIZE-phase claim-generation tool handlers (thesis → antithesis →
//! synthesis). Paired with [`super::innovation`], which covers the
//! falsification/novelty/scoring half of the same phase.

use forge_domain::error::tool_error;
use forge_domain::state::claim::{ContributedBy, Evidence, EvidenceType, KnowledgeClaim, ClaimStatus, RoundClaim};
use forge_domain::state::forge_state::{ForgeState, MAX_CLAIMS_PER_ROUND};
use serde::Deserialize;
use serde_json::{json, Value};

use forge_sessions::ClaimsStore;

use super::{ok, parse_args};

pub struct GenerationHandlers;

#[derive(Deserialize)]
struct StateThesisArgs {
    thesis_text: String,
    #[allow(dead_code)]
    direction: String,
    supporting_evidence: Vec<String>,
}

#[derive(Deserialize)]
struct FindAntithesisArgs {
    claim_index: usize,
    antithesis_text: String,
    contradicting_evidence: Vec<String>,
}

#[derive(Deserialize)]
struct CreateSynthesisArgs {
    claim_index: usize,
    claim_text: String,
    thesis_text: String,
    antithesis_text: String,
    falsifiability_condition: String,
    confidence: f64,
    evidence: Vec<String>,
    #[serde(default)]
    builds_on_claim_id: Option<String>,
    resonance_prompt: String,
    resonance_options: Vec<String>,
}

impl GenerationHandlers {
    pub fn state_thesis(_state: &mut ForgeState, args: Value) -> Value {
        let req: StateThesisArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if req.supporting_evidence.is_empty() {
            return tool_error("DECOMPOSE_INCOMPLETE", "supporting_evidence must not be empty");
        }
        ok(json!({"thesis_text": req.thesis_text}))
    }

    /// Precondition: research-first. Marks `antitheses_searched[claim_index]`.
    pub fn find_antithesis(state: &mut ForgeState, args: Value) -> Value {
        if !state.has_web_search_this_phase() {
            return tool_error("ANTITHESIS_NOT_SEARCHED", "research this phase is required before find_antithesis");
        }
        let req: FindAntithesisArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if req.contradicting_evidence.is_empty() {
            return tool_error("DECOMPOSE_INCOMPLETE", "contradicting_evidence must not be empty");
        }
        state.antitheses_searched.insert(req.claim_index);
        ok(json!({"claim_index": req.claim_index, "antithesis_text": req.antithesis_text}))
    }

    /// Enforces the claim-limit and antithesis-first gates; in round ≥ 1
    /// also requires `builds_on_claim_id` to reference a prior claim.
    /// Persists a durable `KnowledgeClaim` + `Evidence` rows and assigns
    /// `claim_id`.
    pub fn create_synthesis(
        state: &mut ForgeState,
        claims: &ClaimsStore,
        session_id: &str,
        args: Value,
    ) -> Value {
        if state.claims_in_round() >= MAX_CLAIMS_PER_ROUND {
            return tool_error("CLAIM_LIMIT_EXCEEDED", format!("at most {MAX_CLAIMS_PER_ROUND} claims per round"));
        }
        let req: CreateSynthesisArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if !state.antitheses_searched.contains(&req.claim_index) {
            return tool_error("ANTITHESIS_NOT_SEARCHED", "find_antithesis must run before create_synthesis");
        }
        if req.evidence.is_empty() {
            return tool_error("UNGROUNDED_CLAIM", "evidence must not be empty");
        }
        if state.current_round >= 1 && req.builds_on_claim_id.is_none() {
            return tool_error("NOT_CUMULATIVE", "round >= 1 claims must build on a prior claim");
        }

        let claim_id = uuid::Uuid::new_v4().to_string();
        if state.current_round >= 1 {
            state.previous_claims_referenced = true;
        }

        state.current_round_claims.push(RoundClaim {
            claim_id: claim_id.clone(),
            claim_text: req.claim_text.clone(),
            thesis_text: req.thesis_text.clone(),
            antithesis_text: req.antithesis_text.clone(),
            falsifiability_condition: req.falsifiability_condition.clone(),
            confidence: req.confidence,
            evidence: Vec::new(),
            builds_on_claim_id: req.builds_on_claim_id.clone(),
            resonance_options: req.resonance_options.clone(),
            verdict: None,
            qualification: None,
            scores: None,
        });

        if let Err(e) = claims.add_claim(
            session_id,
            KnowledgeClaim {
                id: claim_id.clone(),
                session_id: session_id.to_string(),
                claim_text: req.claim_text,
                thesis_text: req.thesis_text,
                antithesis_text: req.antithesis_text,
                phase_created: state.current_phase.as_str().to_string(),
                round_created: state.current_round,
                status: ClaimStatus::Proposed,
                confidence: req.confidence,
                falsifiability_condition: req.falsifiability_condition,
                qualification: None,
                scores: None,
                rejection_reason: None,
            },
        ) {
            return tool_error("INTERNAL_ERROR", format!("failed to persist claim: {e}"));
        }

        for url in req.evidence {
            let _ = claims.add_evidence(
                session_id,
                Evidence {
                    id: uuid::Uuid::new_v4().to_string(),
                    claim_id: claim_id.clone(),
                    session_id: session_id.to_string(),
                    url,
                    title: String::new(),
                    summary: String::new(),
                    evidence_type: EvidenceType::Supporting,
                    contributed_by: ContributedBy::Agent,
                },
            );
        }

        ok(json!({"claim_id": claim_id, "resonance_prompt": req.resonance_prompt}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_store() -> (tempfile::TempDir, ClaimsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ClaimsStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn create_synthesis_rejects_without_antithesis() {
        let (_dir, claims) = claims_store();
        let mut state = ForgeState::default();
        let result = GenerationHandlers::create_synthesis(
            &mut state,
            &claims,
            "s1",
            json!({
                "claim_index": 0,
                "claim_text": "c",
                "thesis_text": "t",
                "antithesis_text": "a",
                "falsifiability_condition": "f",
                "confidence": 0.5,
                "evidence": ["e1"],
                "resonance_prompt": "p",
                "resonance_options": [],
            }),
        );
        assert_eq!(result["error_code"], "ANTITHESIS_NOT_SEARCHED");
    }

    #[test]
    fn create_synthesis_persists_a_claim() {
        let (_dir, claims) = claims_store();
        let mut state = ForgeState::default();
        state.antitheses_searched.insert(0);
        let result = GenerationHandlers::create_synthesis(
            &mut state,
            &claims,
            "s1",
            json!({
                "claim_index": 0,
                "claim_text": "c",
                "thesis_text": "t",
                "antithesis_text": "a",
                "falsifiability_condition": "f",
                "confidence": 0.5,
                "evidence": ["e1"],
                "resonance_prompt": "p",
                "resonance_options": [],
            }),
        );
        assert_eq!(result["status"], "ok");
        assert_eq!(state.current_round_claims.len(), 1);
        assert_eq!(claims.graph("s1").claims.len(), 1);
    }

    #[test]
    fn create_synthesis_enforces_claim_limit() {
        let (_dir, claims) = claims_store();
        let mut state = ForgeState::default();
        for i in 0..3 {
            state.antitheses_searched.insert(i);
            GenerationHandlers::create_synthesis(
                &mut state,
                &claims,
                "s1",
                json!({
                    "claim_index": i,
                    "claim_text": "c",
                    "thesis_text": "t",
                    "antithesis_text": "a",
                    "falsifiability_condition": "f",
                    "confidence": 0.5,
                    "evidence": ["e1"],
                    "resonance_prompt": "p",
                    "resonance_options": [],
                }),
            );
        }
        let result = GenerationHandlers::create_synthesis(
            &mut state,
            &claims,
            "s1",
            json!({
                "claim_index": 3,
                "claim_text": "c",
                "thesis_text": "t",
                "antithesis_text": "a",
                "falsifiability_condition": "f",
                "confidence": 0.5,
                "evidence": ["e1"],
                "resonance_prompt": "p",
                "resonance_options": [],
            }),
        );
        assert_eq!(result["error_code"], "CLAIM_LIMIT_EXCEEDED");
    }
}
