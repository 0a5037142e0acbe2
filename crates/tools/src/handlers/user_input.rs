//! Applies a structured `POST /user-input` body directly onto `ForgeState`,
//! bypassing the model for the one phase-closing decision the user (not the
//! agent) is meant to make.
//!
//! `present_round`/`ask_user`/`generate_final_spec` are the only pause
//! tools (see `handlers::interaction`); which of the five review shapes
//! below a pause expects is decided by the caller from
//! `(current_phase, awaiting_input_type)`, not by the tag alone — the same
//! `present_round` tool pauses every phase, and each phase's round review
//! has a different payload.

use forge_domain::error::tool_error;
use forge_domain::state::claim::{ClaimStatus, Contradiction, Verdict};
use forge_domain::state::forge_state::{ForgeState, ResearchDirective};
use serde::Deserialize;
use serde_json::{json, Value};

use forge_sessions::ClaimsStore;

use super::{ok, parse_args};
use super::validate::ValidateHandlers;

/// One reviewed item: which indexed assumption/reframing/analogy the
/// response is about, which of its preset options the user picked (where
/// applicable), and an optional free-text override.
#[derive(Deserialize)]
pub struct ReviewResponse {
    pub index: usize,
    #[serde(default)]
    pub selected_option: Option<usize>,
    #[serde(default)]
    pub custom: Option<String>,
}

#[derive(Deserialize)]
pub struct AnalogyResponse {
    pub index: usize,
    #[serde(default)]
    pub resonated: bool,
}

#[derive(Deserialize)]
pub struct AddedContradiction {
    pub property_a: String,
    pub property_b: String,
    pub description: String,
}

#[derive(Deserialize)]
pub struct ClaimResponse {
    pub index: usize,
    #[serde(default = "default_keep")]
    pub keep: bool,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_keep() -> bool {
    true
}

#[derive(Deserialize)]
pub struct VerdictEntry {
    pub claim_index: usize,
    pub verdict: Verdict,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub merge_with_claim_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserInputPayload {
    DecomposeReview {
        #[serde(default)]
        assumption_responses: Vec<ReviewResponse>,
        #[serde(default)]
        reframing_responses: Vec<ReviewResponse>,
        #[serde(default)]
        suggested_domains: Vec<String>,
    },
    ExploreReview {
        #[serde(default)]
        analogy_responses: Vec<AnalogyResponse>,
        #[serde(default)]
        added_contradictions: Vec<AddedContradiction>,
        #[serde(default)]
        suggested_domains: Vec<String>,
    },
    ClaimsReview {
        #[serde(default)]
        claim_responses: Vec<ClaimResponse>,
    },
    Verdicts {
        #[serde(default)]
        entries: Vec<VerdictEntry>,
    },
    BuildDecision {
        decision: BuildDecisionKind,
        #[serde(default)]
        selected_gaps: Vec<String>,
        #[serde(default)]
        continue_direction: Option<String>,
        #[serde(default)]
        deep_dive_claim_id: Option<String>,
        #[serde(default)]
        user_insight: Option<String>,
        #[serde(default)]
        user_evidence_urls: Vec<String>,
    },
    /// Free-text answer to an `ask_user` pause; not a round review.
    Answer { text: String },
}

#[derive(Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BuildDecisionKind {
    Continue,
    DeepDive,
    Resolve,
    AddInsight,
}

pub struct UserInputHandlers;

impl UserInputHandlers {
    /// Apply a review, clear the pause, and return a `{"status": "ok",
    /// "summary": ...}` value whose `summary` is meant to be replayed back
    /// to the model as the next turn's user message.
    pub fn apply(state: &mut ForgeState, claims: &ClaimsStore, session_id: &str, args: Value) -> Value {
        let payload: UserInputPayload = match parse_args(args) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let summary = match payload {
            UserInputPayload::DecomposeReview { assumption_responses, reframing_responses, suggested_domains } => {
                apply_decompose_review(state, assumption_responses, reframing_responses, suggested_domains)
            }
            UserInputPayload::ExploreReview { analogy_responses, added_contradictions, suggested_domains } => {
                apply_explore_review(state, analogy_responses, added_contradictions, suggested_domains)
            }
            UserInputPayload::ClaimsReview { claim_responses } => apply_claims_review(state, claim_responses),
            UserInputPayload::Verdicts { entries } => {
                match apply_verdicts(state, claims, session_id, entries) {
                    Ok(summary) => summary,
                    Err(e) => return e,
                }
            }
            UserInputPayload::BuildDecision {
                decision,
                selected_gaps,
                continue_direction,
                deep_dive_claim_id,
                user_insight,
                user_evidence_urls,
            } => apply_build_decision(
                state,
                claims,
                session_id,
                decision,
                selected_gaps,
                continue_direction,
                deep_dive_claim_id,
                user_insight,
                user_evidence_urls,
            ),
            UserInputPayload::Answer { text } => format!("The user answered: {text}"),
        };
        state.awaiting_user_input = false;
        state.awaiting_input_type = None;
        ok(json!({"summary": summary}))
    }
}

fn apply_decompose_review(
    state: &mut ForgeState,
    assumption_responses: Vec<ReviewResponse>,
    reframing_responses: Vec<ReviewResponse>,
    suggested_domains: Vec<String>,
) -> String {
    for r in &assumption_responses {
        if let Some(a) = state.assumptions.get_mut(r.index) {
            if let Some(custom) = &r.custom {
                a.options.push(custom.clone());
                a.selected_option = Some(a.options.len() - 1);
            } else if let Some(opt) = r.selected_option {
                a.selected_option = Some(opt);
            }
        }
    }
    for r in &reframing_responses {
        if let Some(rf) = state.reframings.get_mut(r.index) {
            if let Some(custom) = &r.custom {
                rf.resonance_options.push(custom.clone());
                rf.selected = Some(rf.resonance_options.len() - 1);
            } else if let Some(opt) = r.selected_option {
                rf.selected = Some(opt);
            }
        }
    }
    for domain in &suggested_domains {
        state.add_research_directive(ResearchDirective {
            directive_type: "domain_hint".to_string(),
            query: domain.clone(),
            domain: Some(domain.clone()),
        });
    }
    format!(
        "Reviewed {} assumption(s) and {} reframing(s); {} domain hint(s) queued for research.",
        assumption_responses.len(),
        reframing_responses.len(),
        suggested_domains.len(),
    )
}

fn apply_explore_review(
    state: &mut ForgeState,
    analogy_responses: Vec<AnalogyResponse>,
    added_contradictions: Vec<AddedContradiction>,
    suggested_domains: Vec<String>,
) -> String {
    for r in &analogy_responses {
        if let Some(a) = state.cross_domain_analogies.get_mut(r.index) {
            a.resonated = r.resonated;
        }
    }
    for c in added_contradictions {
        state.contradictions.push(Contradiction {
            property_a: c.property_a,
            property_b: c.property_b,
            description: c.description,
        });
    }
    for domain in &suggested_domains {
        state.add_research_directive(ResearchDirective {
            directive_type: "domain_hint".to_string(),
            query: domain.clone(),
            domain: Some(domain.clone()),
        });
    }
    format!(
        "Reviewed {} analogy response(s); {} domain hint(s) queued for research.",
        analogy_responses.len(),
        suggested_domains.len(),
    )
}

/// `claims_review` carries no gate of its own — SYNTHESIZE → VALIDATE only
/// requires every claim to have an antithesis. The user's keep/drop notes
/// are steering signal for the model, recorded on the working document
/// rather than a new `ForgeState` field.
fn apply_claims_review(state: &mut ForgeState, claim_responses: Vec<ClaimResponse>) -> String {
    let mut lines = Vec::new();
    for r in &claim_responses {
        let claim_text =
            state.current_round_claims.get(r.index).map(|c| c.claim_text.as_str()).unwrap_or("(unknown claim)");
        let verdict = if r.keep { "keep" } else { "drop" };
        match &r.note {
            Some(note) => lines.push(format!("claim {}: {claim_text} — {verdict} ({note})", r.index)),
            None => lines.push(format!("claim {}: {claim_text} — {verdict}", r.index)),
        }
    }
    let entry = state.working_document.entry("synthesize".to_string()).or_default();
    if !lines.is_empty() {
        if !entry.is_empty() {
            entry.push('\n');
        }
        entry.push_str("User claim review:\n");
        entry.push_str(&lines.join("\n"));
    }
    format!("User reviewed {} claim(s) this round.", claim_responses.len())
}

fn apply_verdicts(
    state: &mut ForgeState,
    claims: &ClaimsStore,
    session_id: &str,
    entries: Vec<VerdictEntry>,
) -> Result<String, Value> {
    let mut accepted = 0;
    let mut rejected = 0;
    for entry in entries {
        if entry.claim_index >= state.current_round_claims.len() {
            return Err(tool_error("UNGROUNDED_CLAIM", "claim index out of range for this round"));
        }
        if entry.verdict == Verdict::Reject {
            let claim_id = state.current_round_claims[entry.claim_index].claim_id.clone();
            state.current_round_claims[entry.claim_index].verdict = Some(Verdict::Reject);
            let reason = entry.rejection_reason.clone();
            let _ = claims.update_claim(session_id, &claim_id, |c| {
                c.status = ClaimStatus::Rejected;
                c.rejection_reason = reason.clone();
            });
            rejected += 1;
            continue;
        }

        let edges = match &entry.merge_with_claim_id {
            Some(target) => vec![json!({"target_claim_id": target, "edge_type": "merged_from"})],
            None => Vec::new(),
        };
        let args = json!({
            "claim_index": entry.claim_index,
            "verdict": entry.verdict,
            "qualification": entry.qualification,
            "edges": edges,
        });
        let result = ValidateHandlers::add_to_knowledge_graph(state, claims, session_id, args);
        if result["status"] == "error" {
            return Err(result);
        }
        accepted += 1;
    }
    Ok(format!("Recorded {accepted} accepted/qualified/merged verdict(s) and {rejected} rejection(s)."))
}

/// `build_decision` doesn't mutate graph state directly — BUILD's own
/// round-advance (`dispatch::advance_build_round`) still owns the
/// BUILD → SYNTHESIZE/CRYSTALLIZE transition. A `proceed: false` decision
/// is recorded as a note the model reads back on the next turn.
#[allow(clippy::too_many_arguments)]
fn apply_build_decision(
    state: &mut ForgeState,
    claims: &ClaimsStore,
    session_id: &str,
    decision: BuildDecisionKind,
    selected_gaps: Vec<String>,
    continue_direction: Option<String>,
    deep_dive_claim_id: Option<String>,
    user_insight: Option<String>,
    user_evidence_urls: Vec<String>,
) -> String {
    match decision {
        BuildDecisionKind::Continue => {
            if let Some(direction) = &continue_direction {
                let entry = state.working_document.entry("build".to_string()).or_default();
                if !entry.is_empty() {
                    entry.push('\n');
                }
                entry.push_str("User steering direction: ");
                entry.push_str(direction);
            }
            "The user chose to continue this round's build as-is.".to_string()
        }
        BuildDecisionKind::DeepDive => {
            state.deep_dive_active = true;
            state.deep_dive_target_claim_id = deep_dive_claim_id.clone();
            format!(
                "The user requested a deep dive on claim {}.",
                deep_dive_claim_id.as_deref().unwrap_or("(unspecified)")
            )
        }
        BuildDecisionKind::Resolve => {
            let before = state.gaps.len();
            state.gaps.retain(|g| !selected_gaps.contains(g));
            let resolved = before - state.gaps.len();
            format!("The user marked {resolved} gap(s) resolved.")
        }
        BuildDecisionKind::AddInsight => {
            let Some(insight_text) = user_insight else {
                return "No insight text was provided; nothing was recorded.".to_string();
            };
            let args = json!({"insight_text": insight_text, "evidence_urls": user_evidence_urls});
            let result = crate::handlers::memory::MemoryHandlers::submit_user_insight(state, claims, session_id, args);
            if result["status"] == "error" {
                return format!("Failed to record the user's insight: {}", result["message"]);
            }
            "The user contributed a new insight as a proposed claim.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_domain::state::claim::{Assumption, ProblemReframing, RoundClaim};

    fn claims_store() -> ClaimsStore {
        let dir = tempfile::tempdir().unwrap();
        ClaimsStore::new(dir.path()).unwrap()
    }

    #[test]
    fn decompose_review_selects_option_and_queues_domain_hint() {
        let mut state = ForgeState::default();
        state.assumptions.push(Assumption {
            text: "a".into(),
            source: "model".into(),
            options: vec!["keep".into(), "drop".into()],
            selected_option: None,
        });
        state.reframings.push(ProblemReframing {
            text: "r".into(),
            reframing_type: "reframe".into(),
            reasoning: "because".into(),
            resonance_options: vec!["weak".into(), "strong".into()],
            selected: None,
        });
        let claims = claims_store();
        let result = UserInputHandlers::apply(
            &mut state,
            &claims,
            "s1",
            json!({
                "type": "decompose_review",
                "assumption_responses": [{"index": 0, "selected_option": 1}],
                "reframing_responses": [{"index": 0, "selected_option": 1}],
                "suggested_domains": ["biology"],
            }),
        );
        assert_eq!(result["status"], "ok");
        assert_eq!(state.assumptions[0].selected_option, Some(1));
        assert_eq!(state.reframings[0].selected, Some(1));
        assert_eq!(state.research_directives.len(), 1);
        assert!(!state.awaiting_user_input);
    }

    #[test]
    fn verdicts_reject_sets_verdict_without_graphing() {
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
        let claims = claims_store();
        let result = UserInputHandlers::apply(
            &mut state,
            &claims,
            "s1",
            json!({
                "type": "verdicts",
                "entries": [{"claim_index": 0, "verdict": "reject", "rejection_reason": "not falsifiable"}],
            }),
        );
        assert_eq!(result["status"], "ok");
        assert_eq!(state.current_round_claims[0].verdict, Some(Verdict::Reject));
        assert!(state.knowledge_graph_nodes.is_empty());
    }

    #[test]
    fn verdicts_accept_admits_to_graph() {
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
        let claims = claims_store();
        let result = UserInputHandlers::apply(
            &mut state,
            &claims,
            "s1",
            json!({
                "type": "verdicts",
                "entries": [{"claim_index": 0, "verdict": "accept"}],
            }),
        );
        assert_eq!(result["status"], "ok");
        assert_eq!(state.knowledge_graph_nodes.len(), 1);
    }

    #[test]
    fn build_decision_continue_records_direction() {
        let mut state = ForgeState::default();
        let claims = claims_store();
        let result = UserInputHandlers::apply(
            &mut state,
            &claims,
            "s1",
            json!({"type": "build_decision", "decision": "continue", "continue_direction": "focus on gap A"}),
        );
        assert_eq!(result["status"], "ok");
        assert!(state.working_document["build"].contains("focus on gap A"));
    }

    #[test]
    fn build_decision_deep_dive_sets_target() {
        let mut state = ForgeState::default();
        let claims = claims_store();
        let result = UserInputHandlers::apply(
            &mut state,
            &claims,
            "s1",
            json!({"type": "build_decision", "decision": "deep_dive", "deep_dive_claim_id": "c1"}),
        );
        assert_eq!(result["status"], "ok");
        assert!(state.deep_dive_active);
        assert_eq!(state.deep_dive_target_claim_id.as_deref(), Some("c1"));
    }

    #[test]
    fn build_decision_resolve_drops_selected_gaps() {
        let mut state = ForgeState::default();
        state.gaps = vec!["gap a".to_string(), "gap b".to_string()];
        let claims = claims_store();
        let result = UserInputHandlers::apply(
            &mut state,
            &claims,
            "s1",
            json!({"type": "build_decision", "decision": "resolve", "selected_gaps": ["gap a"]}),
        );
        assert_eq!(result["status"], "ok");
        assert_eq!(state.gaps, vec!["gap b".to_string()]);
    }

    #[test]
    fn build_decision_add_insight_creates_a_claim() {
        let mut state = ForgeState::default();
        let claims = claims_store();
        let result = UserInputHandlers::apply(
            &mut state,
            &claims,
            "s1",
            json!({
                "type": "build_decision",
                "decision": "add_insight",
                "user_insight": "worth considering X",
                "user_evidence_urls": ["https://example.com"],
            }),
        );
        assert_eq!(result["status"], "ok");
    }
}
