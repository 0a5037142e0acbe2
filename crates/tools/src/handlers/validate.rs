//! VALIDATE-phase tool handlers.

use forge_domain::error::tool_error;
use forge_domain::state::claim::{ClaimEdge, ClaimStatus, EdgeType, Verdict};
use forge_domain::state::forge_state::{ForgeState, KnowledgeGraphEdge, KnowledgeGraphNode};
use serde::Deserialize;
use serde_json::{json, Value};

use forge_sessions::ClaimsStore;

use super::{ok, parse_args};

pub struct ValidateHandlers;

#[derive(Deserialize)]
struct EdgeArg {
    target_claim_id: String,
    edge_type: EdgeType,
}

#[derive(Deserialize)]
struct AddToKnowledgeGraphArgs {
    claim_index: usize,
    verdict: Verdict,
    #[serde(default)]
    qualification: Option<String>,
    edges: Vec<EdgeArg>,
}

#[derive(Deserialize)]
struct AnalyzeGapsArgs {
    gaps: Vec<String>,
    convergence_locks: Vec<String>,
}

impl ValidateHandlers {
    /// Requires a user verdict of `accept`/`qualify`/`merge` on the claim.
    /// Appends a node + its edges to the cumulative graph and persists
    /// `ClaimEdge` rows. Claims graphed with `reject` are not admitted —
    /// the verdict gate rejects that case before any mutation.
    pub fn add_to_knowledge_graph(
        state: &mut ForgeState,
        claims: &ClaimsStore,
        session_id: &str,
        args: Value,
    ) -> Value {
        let req: AddToKnowledgeGraphArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if req.claim_index >= state.current_round_claims.len() {
            return tool_error("UNGROUNDED_CLAIM", "claim index out of range for this round");
        }
        if !matches!(req.verdict, Verdict::Accept | Verdict::Qualify | Verdict::Merge) {
            return tool_error("INVALID_VERDICT", "verdict must be accept, qualify, or merge");
        }

        let claim_id = state.current_round_claims[req.claim_index].claim_id.clone();
        state.current_round_claims[req.claim_index].verdict = Some(req.verdict);
        state.current_round_claims[req.claim_index].qualification = req.qualification.clone();

        let status = if req.verdict == Verdict::Qualify { ClaimStatus::Qualified } else { ClaimStatus::Validated };
        let _ = claims.update_claim(session_id, &claim_id, |c| {
            c.status = status;
            c.qualification = req.qualification.clone();
        });

        state.knowledge_graph_nodes.push(KnowledgeGraphNode {
            claim_id: claim_id.clone(),
            status: status_str(status).to_string(),
        });

        for edge in req.edges {
            state.knowledge_graph_edges.push(KnowledgeGraphEdge {
                source_claim_id: claim_id.clone(),
                target_claim_id: edge.target_claim_id.clone(),
                edge_type: edge.edge_type,
            });
            let _ = claims.add_edge(
                session_id,
                ClaimEdge {
                    id: uuid::Uuid::new_v4().to_string(),
                    session_id: session_id.to_string(),
                    source_claim_id: claim_id.clone(),
                    target_claim_id: edge.target_claim_id,
                    edge_type: edge.edge_type,
                },
            );
        }

        ok(json!({"claim_id": claim_id, "graph_node_count": state.knowledge_graph_nodes.len()}))
    }

    pub fn analyze_gaps(state: &mut ForgeState, args: Value) -> Value {
        let req: AnalyzeGapsArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        state.gaps.extend(req.gaps.clone());
        ok(json!({"gap_count": state.gaps.len(), "convergence_locks": req.convergence_locks}))
    }

    /// Sets `negative_knowledge_consulted`; returns the cumulative list.
    pub fn get_negative_knowledge(state: &mut ForgeState, _args: Value) -> Value {
        state.negative_knowledge_consulted = true;
        ok(json!({"negative_knowledge": state.negative_knowledge}))
    }
}

fn status_str(status: ClaimStatus) -> &'static str {
    match status {
        ClaimStatus::Proposed => "proposed",
        ClaimStatus::Validated => "validated",
        ClaimStatus::Qualified => "qualified",
        ClaimStatus::Rejected => "rejected",
        ClaimStatus::Superseded => "superseded",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_domain::state::claim::RoundClaim;

    fn with_one_claim() -> ForgeState {
        let mut state = ForgeState::default();
        state.current_round_claims.push(RoundClaim {
            claim_id: "c1".into(),
            claim_text: "t".into(),
            thesis_text: "t".into(),
            antithesis_text: "a".into(),
            falsifiability_condition: "f".into(),
            confidence: 0.5,
            evidence: Vec::new(),
            builds_on_claim_id: None,
            resonance_options: Vec::new(),
            verdict: None,
            qualification: None,
            scores: None,
        });
        state
    }

    #[test]
    fn add_to_knowledge_graph_rejects_reject_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let claims = ClaimsStore::new(dir.path()).unwrap();
        let mut state = with_one_claim();
        let result = ValidateHandlers::add_to_knowledge_graph(
            &mut state,
            &claims,
            "s1",
            json!({"claim_index": 0, "verdict": "reject", "edges": []}),
        );
        assert_eq!(result["error_code"], "INVALID_VERDICT");
    }

    #[test]
    fn add_to_knowledge_graph_accepts_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let claims = ClaimsStore::new(dir.path()).unwrap();
        let mut state = with_one_claim();
        let result = ValidateHandlers::add_to_knowledge_graph(
            &mut state,
            &claims,
            "s1",
            json!({"claim_index": 0, "verdict": "accept", "edges": []}),
        );
        assert_eq!(result["status"], "ok");
        assert_eq!(state.knowledge_graph_nodes.len(), 1);
    }

    #[test]
    fn get_negative_knowledge_sets_consulted_flag() {
        let mut state = ForgeState::default();
        assert!(!state.negative_knowledge_consulted);
        ValidateHandlers::get_negative_knowledge(&mut state, json!({}));
        assert!(state.negative_knowledge_consulted);
    }
}
