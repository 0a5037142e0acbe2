//! Per-phase review payloads — built at a `present_round`/`generate_final_spec`
//! pause so the client has something to render before the user submits a
//! decision. One event type per phase; CRYSTALLIZE's is `knowledge_document`
//! rather than a `review_*` name since it carries the finished artifact, not
//! a set of items awaiting a verdict.

use forge_domain::phase::Phase;
use forge_domain::state::forge_state::ForgeState;
use serde_json::{json, Value};

/// Build the review payload for the phase a pause is currently sitting in.
/// Returns `None` for CRYSTALLIZE before `generate_knowledge_document` has
/// run — there's nothing yet to show.
pub fn build_review_event(state: &ForgeState) -> Option<(&'static str, Value)> {
    match state.current_phase {
        Phase::Decompose => Some(("review_decompose", decompose_payload(state))),
        Phase::Explore => Some(("review_explore", explore_payload(state))),
        // SYNTHESIZE and VALIDATE both present the same round-claims shape —
        // SYNTHESIZE awaiting keep/drop, VALIDATE awaiting accept/reject/
        // qualify/merge verdicts.
        Phase::Synthesize | Phase::Validate => Some(("review_claims", claims_payload(state))),
        Phase::Build => Some(("review_build", build_payload(state))),
        Phase::Crystallize => state
            .knowledge_document_markdown
            .clone()
            .map(|md| ("knowledge_document", Value::String(md))),
    }
}

fn decompose_payload(state: &ForgeState) -> Value {
    let assumptions: Vec<Value> = state
        .assumptions
        .iter()
        .map(|a| {
            json!({
                "text": a.text,
                "source": a.source,
                "options": a.options,
                "confirmed": a.selected_option.is_some(),
            })
        })
        .collect();

    let reframings: Vec<Value> = state
        .reframings
        .iter()
        .map(|r| {
            json!({
                "text": r.text,
                "type": r.reframing_type,
                "reasoning": r.reasoning,
                "resonance_options": r.resonance_options,
                "selected": r.selected.is_some(),
            })
        })
        .collect();

    json!({
        "fundamentals": state.fundamentals,
        "assumptions": assumptions,
        "reframings": reframings,
    })
}

fn explore_payload(state: &ForgeState) -> Value {
    let morphological_box = state.morphological_box.as_ref().map(|mbox| {
        let parameters: Vec<Value> = mbox
            .parameters
            .iter()
            .map(|p| json!({ "name": p.name, "values": p.values }))
            .collect();
        json!({ "parameters": parameters })
    });

    let analogies: Vec<Value> = state
        .cross_domain_analogies
        .iter()
        .map(|a| {
            json!({
                "domain": a.domain,
                "description": a.description,
                "semantic_distance": a.semantic_distance,
                "resonance_options": a.resonance_options,
                "starred": a.resonated,
            })
        })
        .collect();

    let contradictions: Vec<Value> = state
        .contradictions
        .iter()
        .map(|c| json!({ "property_a": c.property_a, "property_b": c.property_b, "description": c.description }))
        .collect();

    let adjacent: Vec<Value> = state.adjacent_possible.iter().map(|a| json!({ "description": a.description })).collect();

    json!({
        "morphological_box": morphological_box,
        "analogies": analogies,
        "contradictions": contradictions,
        "adjacent": adjacent,
    })
}

fn claims_payload(state: &ForgeState) -> Value {
    let claims: Vec<Value> = state
        .current_round_claims
        .iter()
        .map(|c| {
            let evidence: Vec<Value> = c
                .evidence
                .iter()
                .map(|e| json!({ "title": e.title, "summary": e.summary, "url": e.url, "type": e.evidence_type }))
                .collect();
            json!({
                "claim_id": c.claim_id,
                "claim_text": c.claim_text,
                "thesis_text": c.thesis_text,
                "antithesis_text": c.antithesis_text,
                "falsifiability_condition": c.falsifiability_condition,
                "confidence": c.confidence,
                "builds_on_claim_id": c.builds_on_claim_id,
                "qualification": c.qualification,
                "verdict": c.verdict,
                "evidence": evidence,
            })
        })
        .collect();

    json!({
        "round": state.current_round,
        "claims": claims,
        "max_rounds_reached": state.max_rounds_reached(),
    })
}

fn build_payload(state: &ForgeState) -> Value {
    let nodes: Vec<Value> =
        state.knowledge_graph_nodes.iter().map(|n| json!({ "claim_id": n.claim_id, "status": n.status })).collect();
    let edges: Vec<Value> = state
        .knowledge_graph_edges
        .iter()
        .map(|e| json!({ "source_claim_id": e.source_claim_id, "target_claim_id": e.target_claim_id, "edge_type": e.edge_type }))
        .collect();

    json!({
        "graph": { "nodes": nodes, "edges": edges },
        "gaps": state.gaps,
        "negative_knowledge": state.negative_knowledge,
        "round": state.current_round,
        "max_rounds_reached": state.max_rounds_reached(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_domain::state::claim::{Evidence, ProblemReframing, RoundClaim};
    use forge_domain::state::forge_state::Assumption;

    #[test]
    fn decompose_event_reports_three_fundamentals_and_three_reframings() {
        let mut state = ForgeState::default();
        state.fundamentals = vec!["concurrency".into(), "tooling".into(), "culture".into()];
        state.assumptions = (0..3)
            .map(|i| Assumption { text: format!("a{i}"), source: "model".into(), options: vec!["x".into(), "y".into()], selected_option: None })
            .collect();
        state.reframings = (0..3)
            .map(|i| ProblemReframing {
                text: format!("r{i}"),
                reframing_type: "inversion".into(),
                reasoning: "because".into(),
                resonance_options: vec!["a".into(), "b".into(), "c".into()],
                selected: None,
            })
            .collect();

        let (event_type, data) = build_review_event(&state).unwrap();
        assert_eq!(event_type, "review_decompose");
        assert_eq!(data["fundamentals"].as_array().unwrap().len(), 3);
        assert_eq!(data["reframings"].as_array().unwrap().len(), 3);
        assert_eq!(data["assumptions"][0]["confirmed"], false);
    }

    #[test]
    fn validate_phase_emits_review_claims() {
        let mut state = ForgeState::default();
        state.current_phase = Phase::Validate;
        state.current_round_claims.push(RoundClaim {
            claim_id: "c0".into(),
            claim_text: "claim".into(),
            thesis_text: "thesis".into(),
            antithesis_text: "antithesis".into(),
            falsifiability_condition: "cond".into(),
            confidence: 0.7,
            evidence: vec![Evidence {
                id: "e0".into(),
                claim_id: "c0".into(),
                session_id: "s1".into(),
                url: "https://example.com".into(),
                title: "t".into(),
                summary: "s".into(),
                evidence_type: forge_domain::state::claim::EvidenceType::Supporting,
                contributed_by: forge_domain::state::claim::ContributedBy::Agent,
            }],
            builds_on_claim_id: None,
            resonance_options: vec![],
            verdict: None,
            qualification: None,
            scores: None,
        });

        let (event_type, data) = build_review_event(&state).unwrap();
        assert_eq!(event_type, "review_claims");
        assert_eq!(data["claims"].as_array().unwrap().len(), 1);
        assert_eq!(data["claims"][0]["evidence"][0]["title"], "t");
    }

    #[test]
    fn crystallize_has_no_review_event_before_the_document_is_drafted() {
        let mut state = ForgeState::default();
        state.current_phase = Phase::Crystallize;
        assert!(build_review_event(&state).is_none());
        state.knowledge_document_markdown = Some("# Knowledge Document".into());
        let (event_type, data) = build_review_event(&state).unwrap();
        assert_eq!(event_type, "knowledge_document");
        assert_eq!(data, "# Knowledge Document");
    }

    #[test]
    fn build_phase_reports_graph_gaps_and_negative_knowledge() {
        let mut state = ForgeState::default();
        state.current_phase = Phase::Build;
        state.knowledge_graph_nodes.push(forge_domain::state::forge_state::KnowledgeGraphNode {
            claim_id: "c0".into(),
            status: "validated".into(),
        });
        state.gaps.push("gap 1".into());
        state.negative_knowledge.push("ruled out X".into());

        let (event_type, data) = build_review_event(&state).unwrap();
        assert_eq!(event_type, "review_build");
        assert_eq!(data["graph"]["nodes"].as_array().unwrap().len(), 1);
        assert_eq!(data["gaps"][0], "gap 1");
        assert_eq!(data["negative_knowledge"][0], "ruled out X");
    }
}
