//! End-to-end scenarios chaining `dispatch` calls across phases on one
//! `ForgeState`, checked against the phase-transition gates in
//! `forge_domain::state::enforce`. Per-handler gate tests already live next
//! to each handler; these exercise the gates in the combinations a real
//! round actually produces.

use forge_domain::state::enforce;
use forge_domain::state::forge_state::ForgeState;
use forge_domain::Phase;
use forge_sessions::ClaimsStore;
use forge_tools::dispatch::{advance_build_round, apply_user_input, dispatch};
use forge_tools::handlers::generation::GenerationHandlers;
use serde_json::{json, Value};

fn claims_store() -> (tempfile::TempDir, ClaimsStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ClaimsStore::new(dir.path()).unwrap();
    (dir, store)
}

async fn call(name: &str, args: Value, state: &mut ForgeState, claims: &ClaimsStore) -> Value {
    dispatch(name, args, state, claims, "s1", None).await
}

async fn three_reframings(state: &mut ForgeState, claims: &ClaimsStore) {
    for (text, kind) in [
        ("invert the constraint", "inversion"),
        ("borrow from biology", "analogy"),
        ("start from first principles", "first_principles"),
    ] {
        let result = call(
            "reframe_problem",
            json!({
                "text": text,
                "type": kind,
                "reasoning": "r",
                "resonance_prompt": "p",
                "resonance_options": ["a", "b", "c"],
            }),
            state,
            claims,
        )
        .await;
        assert_eq!(result["status"], "ok");
    }
}

async fn record_three_assumptions(state: &mut ForgeState, claims: &ClaimsStore) {
    let result = call(
        "extract_assumptions",
        json!({
            "assumptions": [
                {"text": "assumption 0", "source": "model", "options": ["x", "y"]},
                {"text": "assumption 1", "source": "model", "options": ["x", "y"]},
                {"text": "assumption 2", "source": "model", "options": ["x", "y"]},
            ],
        }),
        state,
        claims,
    )
    .await;
    assert_eq!(result["status"], "ok");
}

#[tokio::test]
async fn happy_phase_one_completion_reaches_validate() {
    let (_dir, claims) = claims_store();
    let mut state = ForgeState::default();

    // DECOMPOSE
    state.record_web_search("prior art", "summary");
    assert_eq!(
        call("decompose_to_fundamentals", json!({"fundamentals": ["f1", "f2"], "approach": "first principles"}), &mut state, &claims).await["status"],
        "ok"
    );
    assert_eq!(
        call("map_state_of_art", json!({"domain": "d", "key_findings": ["x"]}), &mut state, &claims).await["status"],
        "ok"
    );
    record_three_assumptions(&mut state, &claims).await;
    three_reframings(&mut state, &claims).await;

    // Not done yet: no reframing has been selected.
    let err = enforce::decompose_to_explore(&state).unwrap();
    assert_eq!(err["error_code"], "DECOMPOSE_INCOMPLETE");

    let review = apply_user_input(
        &mut state,
        &claims,
        "s1",
        json!({
            "type": "decompose_review",
            "assumption_responses": [],
            "reframing_responses": [{"index": 0, "selected_option": 1}],
            "suggested_domains": [],
        }),
    );
    assert_eq!(review["status"], "ok");
    assert!(enforce::decompose_to_explore(&state).is_none());
    state.transition_to(Phase::Explore);

    // EXPLORE
    state.record_web_search("cross-domain q", "summary");
    assert_eq!(
        call(
            "build_morphological_box",
            json!({"parameters": [
                {"name": "p1", "values": ["a", "b", "c"]},
                {"name": "p2", "values": ["a", "b", "c"]},
                {"name": "p3", "values": ["a", "b", "c"]},
            ]}),
            &mut state,
            &claims,
        )
        .await["status"],
        "ok"
    );
    assert_eq!(
        call(
            "identify_contradictions",
            json!({"property_a": "speed", "property_b": "safety", "description": "d"}),
            &mut state,
            &claims,
        )
        .await["status"],
        "ok"
    );
    for _ in 0..2 {
        assert_eq!(
            call(
                "search_cross_domain",
                json!({
                    "source_domain": "biology",
                    "target_application": "networking",
                    "analogy_description": "d",
                    "semantic_distance": 0.6,
                    "key_findings": ["x"],
                    "resonance_prompt": "p",
                    "resonance_options": ["a", "b"],
                }),
                &mut state,
                &claims,
            )
            .await["status"],
            "ok"
        );
    }
    assert_eq!(state.cross_domain_search_count, 2);

    let err = enforce::explore_to_synthesize(&state).unwrap();
    assert_eq!(err["error_code"], "DECOMPOSE_INCOMPLETE");

    let review = apply_user_input(
        &mut state,
        &claims,
        "s1",
        json!({
            "type": "explore_review",
            "analogy_responses": [{"index": 0, "resonated": true}],
            "added_contradictions": [],
            "suggested_domains": [],
        }),
    );
    assert_eq!(review["status"], "ok");
    assert!(enforce::explore_to_synthesize(&state).is_none());
    state.transition_to(Phase::Synthesize);

    // SYNTHESIZE (round 0)
    state.record_web_search("claim research", "summary");
    assert_eq!(
        call("state_thesis", json!({"thesis_text": "t", "direction": "d", "supporting_evidence": ["e1"]}), &mut state, &claims).await["status"],
        "ok"
    );
    assert_eq!(
        call("find_antithesis", json!({"claim_index": 0, "antithesis_text": "a", "contradicting_evidence": ["e1"]}), &mut state, &claims).await["status"],
        "ok"
    );
    let synth = call(
        "create_synthesis",
        json!({
            "claim_index": 0, "claim_text": "c", "thesis_text": "t", "antithesis_text": "a",
            "falsifiability_condition": "f", "confidence": 0.7, "evidence": ["e1"],
            "resonance_prompt": "p", "resonance_options": [],
        }),
        &mut state,
        &claims,
    )
    .await;
    assert_eq!(synth["status"], "ok");
    assert_eq!(
        call("attempt_falsification", json!({"claim_index": 0, "approach": "x", "result": "survived", "falsified": false, "evidence": ["e1"]}), &mut state, &claims).await["status"],
        "ok"
    );
    assert_eq!(
        call("check_novelty", json!({"claim_index": 0, "existing_knowledge": "k", "is_novel": true, "novelty_explanation": "n"}), &mut state, &claims).await["status"],
        "ok"
    );
    assert_eq!(
        call(
            "score_claim",
            json!({"claim_index": 0, "novelty": 0.8, "groundedness": 0.8, "falsifiability": 0.8, "significance": 0.8, "reasoning": "r"}),
            &mut state,
            &claims,
        )
        .await["status"],
        "ok"
    );

    assert!(enforce::synthesize_to_validate(&state).is_none());
    state.transition_to(Phase::Validate);

    // VALIDATE
    assert_eq!(
        call("add_to_knowledge_graph", json!({"claim_index": 0, "verdict": "accept", "edges": []}), &mut state, &claims).await["status"],
        "ok"
    );
    assert_eq!(
        call("analyze_gaps", json!({"gaps": ["g1"], "convergence_locks": []}), &mut state, &claims).await["status"],
        "ok"
    );
    assert_eq!(call("get_negative_knowledge", json!({}), &mut state, &claims).await["status"], "ok");

    assert_eq!(state.current_phase, Phase::Validate);
    assert_eq!(state.knowledge_graph_nodes.len(), 1);
    assert!(state.negative_knowledge_consulted);
    assert_eq!(claims.graph("s1").claims.len(), 1);
}

#[tokio::test]
async fn missing_state_of_art_research_blocks_leaving_decompose() {
    let (_dir, claims) = claims_store();
    let mut state = ForgeState::default();
    call("decompose_to_fundamentals", json!({"fundamentals": ["f1"], "approach": "a"}), &mut state, &claims).await;
    record_three_assumptions(&mut state, &claims).await;
    three_reframings(&mut state, &claims).await;
    state.reframings[0].selected = Some(0);

    // Every other requirement is satisfied; only the research gate is not.
    let err = enforce::decompose_to_explore(&state).unwrap();
    assert_eq!(err["error_code"], "STATE_OF_ART_NOT_RESEARCHED");
}

#[test]
fn round_two_cumulative_gate_requires_prior_claim_reference() {
    let (_dir, claims) = claims_store();
    let mut state = ForgeState::default();
    state.current_round = 1;
    state.antitheses_searched.insert(0);

    // A round-1 claim that doesn't build on a prior one is rejected...
    let rejected = GenerationHandlers::create_synthesis(
        &mut state,
        &claims,
        "s1",
        json!({
            "claim_index": 0, "claim_text": "c", "thesis_text": "t", "antithesis_text": "a",
            "falsifiability_condition": "f", "confidence": 0.6, "evidence": ["e1"],
            "resonance_prompt": "p", "resonance_options": [],
        }),
    );
    assert_eq!(rejected["error_code"], "NOT_CUMULATIVE");
    assert!(!state.previous_claims_referenced);

    // ...but succeeds once it references a prior round's claim, which in
    // turn satisfies the BUILD → SYNTHESIZE gate's cumulativeness check.
    let accepted = GenerationHandlers::create_synthesis(
        &mut state,
        &claims,
        "s1",
        json!({
            "claim_index": 0, "claim_text": "c", "thesis_text": "t", "antithesis_text": "a",
            "falsifiability_condition": "f", "confidence": 0.6, "evidence": ["e1"],
            "builds_on_claim_id": "prior-claim-id",
            "resonance_prompt": "p", "resonance_options": [],
        }),
    );
    assert_eq!(accepted["status"], "ok");
    assert!(state.previous_claims_referenced);

    let err = advance_build_round(&mut state);
    assert_eq!(err["error_code"], "NEGATIVE_KNOWLEDGE_MISSING");

    state.negative_knowledge_consulted = true;
    let advanced = advance_build_round(&mut state);
    assert_eq!(advanced["status"], "ok");
    assert_eq!(state.current_round, 2);
    assert_eq!(state.current_phase, Phase::Synthesize);
}

#[test]
fn ask_user_pause_is_cleared_by_a_plain_answer() {
    let (_dir, claims) = claims_store();
    let mut state = ForgeState::default();

    forge_tools::handlers::interaction::InteractionHandlers::ask_user(&mut state, json!({"question": "which direction?"}));
    assert!(state.awaiting_user_input);
    assert_eq!(state.awaiting_input_type.as_deref(), Some("question"));

    let result = apply_user_input(
        &mut state,
        &claims,
        "s1",
        json!({"type": "answer", "text": "go with the inversion"}),
    );
    assert_eq!(result["status"], "ok");
    assert!(result["summary"].as_str().unwrap().contains("go with the inversion"));
    assert!(!state.awaiting_user_input);
    assert!(state.awaiting_input_type.is_none());
}
