//! Cross-cutting memory tool handlers: session status, user insight, and
//! recall over the phase history and research archive.

use forge_domain::error::tool_error;
use forge_domain::phase::Phase;
use forge_domain::state::claim::{ContributedBy, Evidence, EvidenceType, ClaimStatus, KnowledgeClaim};
use forge_domain::state::forge_state::{ForgeState, KnowledgeGraphNode};
use serde::Deserialize;
use serde_json::{json, Value};

use forge_sessions::ClaimsStore;

use super::{ok, parse_args};

pub struct MemoryHandlers;

const KNOWN_SECTIONS: &[&str] = &["decompose", "explore", "synthesize", "validate", "build", "crystallize"];

fn phase_order(phase: Phase) -> usize {
    match phase {
        Phase::Decompose => 0,
        Phase::Explore => 1,
        Phase::Synthesize => 2,
        Phase::Validate => 3,
        Phase::Build => 4,
        Phase::Crystallize => 5,
    }
}

#[derive(Deserialize)]
struct RecallPhaseContextArgs {
    phase: String,
    artifact: String,
}

#[derive(Deserialize)]
struct SearchResearchArchiveArgs {
    keywords: Vec<String>,
    #[serde(default)]
    phase: Option<String>,
    #[serde(default)]
    purpose: Option<String>,
    #[serde(default)]
    max_results: Option<usize>,
}

#[derive(Deserialize)]
struct UpdateWorkingDocumentArgs {
    section: String,
    content: String,
}

#[derive(Deserialize)]
struct ReadWorkingDocumentArgs {
    #[serde(default)]
    section: Option<String>,
}

#[derive(Deserialize)]
struct SubmitUserInsightArgs {
    insight_text: String,
    #[serde(default)]
    evidence_urls: Vec<String>,
    #[serde(default)]
    relates_to_claim_id: Option<String>,
}

fn parse_phase(name: &str) -> Option<Phase> {
    match name {
        "decompose" => Some(Phase::Decompose),
        "explore" => Some(Phase::Explore),
        "synthesize" => Some(Phase::Synthesize),
        "validate" => Some(Phase::Validate),
        "build" => Some(Phase::Build),
        "crystallize" => Some(Phase::Crystallize),
        _ => None,
    }
}

impl MemoryHandlers {
    pub fn get_session_status(state: &mut ForgeState, _args: Value) -> Value {
        ok(json!({
            "phase": state.current_phase.as_str(),
            "round": state.current_round,
            "claims_in_round": state.claims_in_round(),
            "claims_remaining": state.claims_remaining(),
            "awaiting_user_input": state.awaiting_user_input,
        }))
    }

    /// Creates a durable user-contributed claim and a graph node.
    pub fn submit_user_insight(
        state: &mut ForgeState,
        claims: &ClaimsStore,
        session_id: &str,
        args: Value,
    ) -> Value {
        let req: SubmitUserInsightArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        let claim_id = uuid::Uuid::new_v4().to_string();
        if let Err(e) = claims.add_claim(
            session_id,
            KnowledgeClaim {
                id: claim_id.clone(),
                session_id: session_id.to_string(),
                claim_text: req.insight_text,
                thesis_text: String::new(),
                antithesis_text: String::new(),
                phase_created: state.current_phase.as_str().to_string(),
                round_created: state.current_round,
                status: ClaimStatus::Proposed,
                confidence: 0.5,
                falsifiability_condition: String::new(),
                qualification: req.relates_to_claim_id.clone(),
                scores: None,
                rejection_reason: None,
            },
        ) {
            return tool_error("INTERNAL_ERROR", format!("failed to persist user insight: {e}"));
        }
        for url in req.evidence_urls {
            let _ = claims.add_evidence(
                session_id,
                Evidence {
                    id: uuid::Uuid::new_v4().to_string(),
                    claim_id: claim_id.clone(),
                    session_id: session_id.to_string(),
                    url,
                    title: String::new(),
                    summary: String::new(),
                    evidence_type: EvidenceType::Contextual,
                    contributed_by: ContributedBy::User,
                },
            );
        }
        state.knowledge_graph_nodes.push(KnowledgeGraphNode {
            claim_id: claim_id.clone(),
            status: "proposed".to_string(),
        });
        ok(json!({"claim_id": claim_id}))
    }

    /// Read-only recall of an artifact from an already-completed phase.
    pub fn recall_phase_context(state: &mut ForgeState, args: Value) -> Value {
        let req: RecallPhaseContextArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        let Some(phase) = parse_phase(&req.phase) else {
            return tool_error("INVALID_PHASE", format!("unknown phase '{}'", req.phase));
        };
        if phase_order(phase) > phase_order(state.current_phase) {
            return tool_error("INVALID_PHASE", "cannot recall a phase that hasn't happened yet");
        }
        let artifact = match (phase, req.artifact.as_str()) {
            (Phase::Decompose, "fundamentals") => json!(state.fundamentals),
            (Phase::Decompose, "assumptions") => json!(state.assumptions),
            (Phase::Decompose, "reframings") => json!(state.reframings),
            (Phase::Explore, "morphological_box") => json!(state.morphological_box),
            (Phase::Explore, "cross_domain_analogies") => json!(state.cross_domain_analogies),
            (Phase::Explore, "contradictions") => json!(state.contradictions),
            (Phase::Synthesize, "current_round_claims") => json!(state.current_round_claims),
            (Phase::Validate, "knowledge_graph_nodes") => json!(state.knowledge_graph_nodes),
            (Phase::Validate, "gaps") => json!(state.gaps),
            (Phase::Crystallize, "knowledge_document_markdown") => json!(state.knowledge_document_markdown),
            _ => return tool_error("ARTIFACT_NOT_FOUND", format!("no artifact '{}' in phase '{}'", req.artifact, req.phase)),
        };
        ok(json!({"phase": req.phase, "artifact": req.artifact, "value": artifact}))
    }

    /// Case-insensitive AND-keyword substring search over `query`+`summary`,
    /// reverse-chronological, capped at 10 results, with a conservative
    /// token-cost estimate (≈300 tokens/result).
    pub fn search_research_archive(state: &mut ForgeState, args: Value) -> Value {
        let req: SearchResearchArchiveArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        let max_results = req.max_results.unwrap_or(10).min(10);
        let keywords: Vec<String> = req.keywords.iter().map(|k| k.to_lowercase()).collect();
        let phase_filter = req.phase.as_deref().and_then(parse_phase);

        let mut matches: Vec<&forge_domain::state::forge_state::ResearchEntry> = state
            .research_archive
            .iter()
            .rev()
            .filter(|entry| phase_filter.map(|p| p == entry.phase).unwrap_or(true))
            .filter(|entry| {
                if let Some(purpose) = &req.purpose {
                    if &entry.purpose != purpose {
                        return false;
                    }
                }
                let haystack = format!("{} {}", entry.query, entry.summary).to_lowercase();
                keywords.iter().all(|k| haystack.contains(k.as_str()))
            })
            .collect();
        matches.truncate(max_results);

        let results: Vec<Value> = matches
            .iter()
            .map(|e| json!({"phase": e.phase.as_str(), "query": e.query, "summary": e.summary, "sources": e.sources}))
            .collect();
        let count = results.len();
        ok(json!({
            "results": results,
            "count": count,
            "token_estimate": count * 300,
        }))
    }

    /// Sets `document_updated_this_phase`; rejects unknown section names.
    pub fn update_working_document(state: &mut ForgeState, args: Value) -> Value {
        let req: UpdateWorkingDocumentArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if !KNOWN_SECTIONS.contains(&req.section.as_str()) {
            return tool_error("ARTIFACT_NOT_FOUND", format!("unknown working-document section '{}'", req.section));
        }
        state.working_document.insert(req.section.clone(), req.content);
        state.document_updated_this_phase = true;
        ok(json!({"section": req.section}))
    }

    /// Table-of-contents mode (section → word count) when `section` is
    /// omitted; full section text otherwise.
    pub fn read_working_document(state: &mut ForgeState, args: Value) -> Value {
        let req: ReadWorkingDocumentArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        match req.section {
            None => {
                let toc: serde_json::Map<String, Value> = state
                    .working_document
                    .iter()
                    .map(|(k, v)| (k.clone(), json!(v.split_whitespace().count())))
                    .collect();
                ok(Value::Object(toc))
            }
            Some(section) => match state.working_document.get(&section) {
                Some(content) => ok(json!({"section": section, "content": content})),
                None => tool_error("ARTIFACT_NOT_FOUND", format!("no such section '{section}'")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_domain::state::forge_state::ResearchEntry;

    #[test]
    fn update_working_document_rejects_unknown_section() {
        let mut state = ForgeState::default();
        let result = MemoryHandlers::update_working_document(
            &mut state,
            json!({"section": "nonsense", "content": "x"}),
        );
        assert_eq!(result["error_code"], "ARTIFACT_NOT_FOUND");
    }

    #[test]
    fn update_then_read_working_document_round_trips() {
        let mut state = ForgeState::default();
        MemoryHandlers::update_working_document(
            &mut state,
            json!({"section": "decompose", "content": "three words here"}),
        );
        assert!(state.document_updated_this_phase);
        let toc = MemoryHandlers::read_working_document(&mut state, json!({}));
        assert_eq!(toc["decompose"], 3);
        let full = MemoryHandlers::read_working_document(&mut state, json!({"section": "decompose"}));
        assert_eq!(full["content"], "three words here");
    }

    #[test]
    fn recall_phase_context_rejects_future_phase() {
        let mut state = ForgeState::default();
        let result = MemoryHandlers::recall_phase_context(
            &mut state,
            json!({"phase": "crystallize", "artifact": "knowledge_document_markdown"}),
        );
        assert_eq!(result["error_code"], "INVALID_PHASE");
    }

    #[test]
    fn search_research_archive_filters_by_and_keyword() {
        let mut state = ForgeState::default();
        state.research_archive.push(ResearchEntry {
            query: "graph databases".into(),
            purpose: "state_of_art".into(),
            phase: Phase::Decompose,
            summary: "widely used for relationship-heavy data".into(),
            sources: vec!["https://example.com".into()],
        });
        state.research_archive.push(ResearchEntry {
            query: "unrelated topic".into(),
            purpose: "state_of_art".into(),
            phase: Phase::Decompose,
            summary: "nothing to do with graphs".into(),
            sources: vec![],
        });
        let result = MemoryHandlers::search_research_archive(
            &mut state,
            json!({"keywords": ["graph", "relationship"]}),
        );
        assert_eq!(result["count"], 1);
    }
}
