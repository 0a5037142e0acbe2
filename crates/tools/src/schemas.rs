//! Tool schemas exposed to the model, grouped by phase.
//!
//! Each `<phase>_tools()` function mirrors one teacher "define tools"
//! module; [`all_tools_for_phase`] assembles the set available for a given
//! phase by combining the phase group with the cross-cutting and research
//! groups.

use forge_domain::phase::Phase;
use forge_domain::tool::ToolDefinition;
use serde_json::json;

fn tool(name: &str, description: &str, parameters: serde_json::Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

pub fn decompose_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "decompose_to_fundamentals",
            "Break the problem into its irreducible fundamentals.",
            json!({
                "type": "object",
                "properties": {
                    "fundamentals": {"type": "array", "items": {"type": "string"}},
                    "approach": {"type": "string"},
                },
                "required": ["fundamentals", "approach"],
            }),
        ),
        tool(
            "map_state_of_art",
            "Record the current state of the art for a domain after researching it.",
            json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "key_findings": {"type": "array", "items": {"type": "string"}},
                },
                "required": ["domain", "key_findings"],
            }),
        ),
        tool(
            "extract_assumptions",
            "Identify hidden assumptions embedded in the problem or current approaches, each with its source and a set of contextual response options.",
            json!({
                "type": "object",
                "properties": {
                    "assumptions": {
                        "type": "array",
                        "minItems": 1,
                        "items": {
                            "type": "object",
                            "properties": {
                                "text": {"type": "string"},
                                "source": {"type": "string"},
                                "options": {
                                    "type": "array",
                                    "items": {"type": "string"},
                                    "minItems": 2,
                                    "maxItems": 4,
                                },
                            },
                            "required": ["text", "source", "options"],
                        },
                    },
                },
                "required": ["assumptions"],
            }),
        ),
        tool(
            "reframe_problem",
            "Propose an alternative framing of the problem for the user to react to.",
            json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string"},
                    "type": {"type": "string"},
                    "reasoning": {"type": "string"},
                    "resonance_prompt": {"type": "string"},
                    "resonance_options": {
                        "type": "array",
                        "items": {"type": "string"},
                        "minItems": 3,
                        "maxItems": 4,
                    },
                },
                "required": ["text", "type", "reasoning", "resonance_prompt", "resonance_options"],
            }),
        ),
    ]
}

pub fn explore_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "build_morphological_box",
            "Lay out the problem's dimensions as a morphological box (at least 3 parameters, each with at least 3 values).",
            json!({
                "type": "object",
                "properties": {
                    "parameters": {
                        "type": "array",
                        "minItems": 3,
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": {"type": "string"},
                                "values": {"type": "array", "items": {"type": "string"}, "minItems": 3},
                            },
                            "required": ["name", "values"],
                        },
                    },
                },
                "required": ["parameters"],
            }),
        ),
        tool(
            "search_cross_domain",
            "Look for an analogous mechanism in a different domain after researching it.",
            json!({
                "type": "object",
                "properties": {
                    "source_domain": {"type": "string"},
                    "target_application": {"type": "string"},
                    "analogy_description": {"type": "string"},
                    "semantic_distance": {"type": "number"},
                    "key_findings": {"type": "array", "items": {"type": "string"}},
                    "resonance_prompt": {"type": "string"},
                    "resonance_options": {"type": "array", "items": {"type": "string"}},
                },
                "required": [
                    "source_domain",
                    "target_application",
                    "analogy_description",
                    "semantic_distance",
                    "key_findings",
                    "resonance_prompt",
                    "resonance_options",
                ],
            }),
        ),
        tool(
            "identify_contradictions",
            "Name a tension between two properties the solution must reconcile.",
            json!({
                "type": "object",
                "properties": {
                    "property_a": {"type": "string"},
                    "property_b": {"type": "string"},
                    "description": {"type": "string"},
                },
                "required": ["property_a", "property_b", "description"],
            }),
        ),
    ]
}

pub fn generation_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "state_thesis",
            "State a thesis: a candidate claim with an initial direction and supporting evidence.",
            json!({
                "type": "object",
                "properties": {
                    "thesis_text": {"type": "string"},
                    "direction": {"type": "string"},
                    "supporting_evidence": {"type": "array", "items": {"type": "string"}, "minItems": 1},
                },
                "required": ["thesis_text", "direction", "supporting_evidence"],
            }),
        ),
        tool(
            "find_antithesis",
            "Research and record the strongest counter-argument to a thesis.",
            json!({
                "type": "object",
                "properties": {
                    "claim_index": {"type": "integer"},
                    "antithesis_text": {"type": "string"},
                    "contradicting_evidence": {"type": "array", "items": {"type": "string"}, "minItems": 1},
                },
                "required": ["claim_index", "antithesis_text", "contradicting_evidence"],
            }),
        ),
        tool(
            "create_synthesis",
            "Reconcile a thesis and its antithesis into a falsifiable claim.",
            json!({
                "type": "object",
                "properties": {
                    "claim_index": {"type": "integer"},
                    "claim_text": {"type": "string"},
                    "thesis_text": {"type": "string"},
                    "antithesis_text": {"type": "string"},
                    "falsifiability_condition": {"type": "string"},
                    "confidence": {"type": "number"},
                    "evidence": {"type": "array", "items": {"type": "string"}, "minItems": 1},
                    "builds_on_claim_id": {"type": ["string", "null"]},
                    "resonance_prompt": {"type": "string"},
                    "resonance_options": {"type": "array", "items": {"type": "string"}},
                },
                "required": [
                    "claim_index",
                    "claim_text",
                    "thesis_text",
                    "antithesis_text",
                    "falsifiability_condition",
                    "confidence",
                    "evidence",
                    "resonance_prompt",
                    "resonance_options",
                ],
            }),
        ),
    ]
}

pub fn innovation_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "attempt_falsification",
            "Try to break a claim: describe the approach, the result, and whether it falsified the claim.",
            json!({
                "type": "object",
                "properties": {
                    "claim_index": {"type": "integer"},
                    "approach": {"type": "string"},
                    "result": {"type": "string"},
                    "falsified": {"type": "boolean"},
                    "evidence": {"type": "array", "items": {"type": "string"}},
                },
                "required": ["claim_index", "approach", "result", "falsified", "evidence"],
            }),
        ),
        tool(
            "check_novelty",
            "Check a claim's novelty against existing knowledge after researching it.",
            json!({
                "type": "object",
                "properties": {
                    "claim_index": {"type": "integer"},
                    "existing_knowledge": {"type": "string"},
                    "is_novel": {"type": "boolean"},
                    "novelty_explanation": {"type": "string"},
                },
                "required": ["claim_index", "existing_knowledge", "is_novel", "novelty_explanation"],
            }),
        ),
        tool(
            "score_claim",
            "Score a claim on novelty, groundedness, falsifiability and significance, once falsification and novelty have both been recorded.",
            json!({
                "type": "object",
                "properties": {
                    "claim_index": {"type": "integer"},
                    "novelty": {"type": "number"},
                    "groundedness": {"type": "number"},
                    "falsifiability": {"type": "number"},
                    "significance": {"type": "number"},
                    "reasoning": {"type": "string"},
                },
                "required": [
                    "claim_index",
                    "novelty",
                    "groundedness",
                    "falsifiability",
                    "significance",
                    "reasoning",
                ],
            }),
        ),
    ]
}

pub fn validate_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "add_to_knowledge_graph",
            "Admit an accepted or qualified claim into the cumulative knowledge graph with its edges to other claims.",
            json!({
                "type": "object",
                "properties": {
                    "claim_index": {"type": "integer"},
                    "verdict": {"type": "string", "enum": ["accept", "qualify", "merge"]},
                    "qualification": {"type": ["string", "null"]},
                    "edges": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "target_claim_id": {"type": "string"},
                                "edge_type": {
                                    "type": "string",
                                    "enum": ["supports", "contradicts", "extends", "supersedes", "depends_on", "merged_from"],
                                },
                            },
                            "required": ["target_claim_id", "edge_type"],
                        },
                    },
                },
                "required": ["claim_index", "verdict", "edges"],
            }),
        ),
        tool(
            "analyze_gaps",
            "Record remaining open gaps and the convergence locks that close them off for this round.",
            json!({
                "type": "object",
                "properties": {
                    "gaps": {"type": "array", "items": {"type": "string"}},
                    "convergence_locks": {"type": "array", "items": {"type": "string"}},
                },
                "required": ["gaps", "convergence_locks"],
            }),
        ),
        tool(
            "get_negative_knowledge",
            "List what has been ruled out so far, before proposing a new round's thesis.",
            json!({"type": "object", "properties": {}}),
        ),
    ]
}

pub fn build_tools() -> Vec<ToolDefinition> {
    // BUILD round-control reuses VALIDATE's negative-knowledge recall; the
    // phase contributes no tool of its own beyond the transition gate.
    Vec::new()
}

pub fn crystallize_tools() -> Vec<ToolDefinition> {
    vec![tool(
        "generate_knowledge_document",
        "Write the final knowledge document, organized into its ten named sections.",
        json!({
            "type": "object",
            "properties": {
                "framing": {"type": "string"},
                "decomposition": {"type": "string"},
                "exploration": {"type": "string"},
                "claims": {"type": "string"},
                "dialectic_process": {"type": "string"},
                "knowledge_graph": {"type": "string"},
                "negative_knowledge": {"type": "string"},
                "gaps": {"type": "string"},
                "convergence_locks": {"type": "string"},
                "round_history": {"type": "string"},
            },
            "required": [
                "framing",
                "decomposition",
                "exploration",
                "claims",
                "dialectic_process",
                "knowledge_graph",
                "negative_knowledge",
                "gaps",
                "convergence_locks",
                "round_history",
            ],
        }),
    )]
}

/// `ask_user`, `present_round`, `generate_final_spec` — pause tools that end
/// the turn and hand control back to the user. Available everywhere except
/// as noted; CRYSTALLIZE uses `generate_final_spec` in place of
/// `present_round`.
pub fn interaction_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "ask_user",
            "Ask the user a clarifying question and pause for their reply.",
            json!({
                "type": "object",
                "properties": {
                    "question": {"type": "string"},
                    "context": {"type": "string"},
                },
                "required": ["question"],
            }),
        ),
        tool(
            "present_round",
            "Present this round's results to the user and pause for their verdicts.",
            json!({
                "type": "object",
                "properties": {
                    "summary": {"type": "string"},
                },
                "required": ["summary"],
            }),
        ),
        tool(
            "generate_final_spec",
            "Signal that the knowledge document is ready for the user's final review.",
            json!({"type": "object", "properties": {}}),
        ),
    ]
}

/// Cross-cutting tools available in multiple phases.
pub fn cross_cutting_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "get_session_status",
            "Report the current phase, round, and progress counters for this session.",
            json!({"type": "object", "properties": {}}),
        ),
        tool(
            "submit_user_insight",
            "Record an insight contributed directly by the user as a claim.",
            json!({
                "type": "object",
                "properties": {
                    "insight_text": {"type": "string"},
                    "evidence_urls": {"type": "array", "items": {"type": "string"}},
                    "relates_to_claim_id": {"type": ["string", "null"]},
                },
                "required": ["insight_text", "evidence_urls"],
            }),
        ),
        tool(
            "recall_phase_context",
            "Recall a named artifact that was produced in a prior, already-completed phase.",
            json!({
                "type": "object",
                "properties": {
                    "phase": {"type": "string"},
                    "artifact": {"type": "string"},
                },
                "required": ["phase", "artifact"],
            }),
        ),
        tool(
            "search_research_archive",
            "Search this session's accumulated research findings by keyword.",
            json!({
                "type": "object",
                "properties": {
                    "keywords": {"type": "array", "items": {"type": "string"}},
                    "phase": {"type": ["string", "null"]},
                    "purpose": {"type": ["string", "null"]},
                    "max_results": {"type": "integer", "maximum": 10},
                },
                "required": ["keywords"],
            }),
        ),
        tool(
            "update_working_document",
            "Write a section of the running working document.",
            json!({
                "type": "object",
                "properties": {
                    "section": {"type": "string"},
                    "content": {"type": "string"},
                },
                "required": ["section", "content"],
            }),
        ),
        tool(
            "read_working_document",
            "Read the working document: omit `section` for a table of contents, or pass it for the full section text.",
            json!({
                "type": "object",
                "properties": {
                    "section": {"type": ["string", "null"]},
                },
            }),
        ),
    ]
}

/// The single `research` tool, delegating to the research sub-agent.
/// Available in every phase except CRYSTALLIZE.
pub fn research_tools() -> Vec<ToolDefinition> {
    vec![tool(
        "research",
        "Delegate a focused web query to the research sub-agent and get back a grounded summary.",
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "purpose": {
                    "type": "string",
                    "enum": [
                        "state_of_art",
                        "evidence_for",
                        "evidence_against",
                        "cross_domain",
                        "novelty_check",
                        "falsification",
                    ],
                },
                "instructions": {"type": ["string", "null"]},
                "max_results": {"type": "integer", "maximum": 10},
            },
            "required": ["query", "purpose"],
        }),
    )]
}

/// Assemble the full tool set available for a given phase: the phase's own
/// tools, the cross-cutting group, the interaction (pause) tools, and the
/// research tool if the phase isn't CRYSTALLIZE.
pub fn all_tools_for_phase(phase: Phase) -> Vec<ToolDefinition> {
    let mut tools = match phase {
        Phase::Decompose => decompose_tools(),
        Phase::Explore => explore_tools(),
        Phase::Synthesize => {
            let mut t = generation_tools();
            t.extend(innovation_tools());
            t
        }
        Phase::Validate => validate_tools(),
        Phase::Build => build_tools(),
        Phase::Crystallize => crystallize_tools(),
    };
    tools.extend(cross_cutting_tools());
    tools.extend(interaction_tools());
    if phase != Phase::Crystallize {
        tools.extend(research_tools());
    }
    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crystallize_has_no_research_tool() {
        let names: Vec<&str> = all_tools_for_phase(Phase::Crystallize)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert!(!names.contains(&"research"));
        assert!(names.contains(&"generate_knowledge_document"));
    }

    #[test]
    fn every_phase_carries_the_cross_cutting_group() {
        for phase in [
            Phase::Decompose,
            Phase::Explore,
            Phase::Synthesize,
            Phase::Validate,
            Phase::Build,
            Phase::Crystallize,
        ] {
            let names: Vec<&str> = all_tools_for_phase(phase).iter().map(|t| t.name.as_str()).collect();
            assert!(names.contains(&"get_session_status"));
            assert!(names.contains(&"update_working_document"));
        }
    }

    #[test]
    fn synthesize_carries_both_generation_and_innovation_tools() {
        let names: Vec<&str> = all_tools_for_phase(Phase::Synthesize)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert!(names.contains(&"create_synthesis"));
        assert!(names.contains(&"score_claim"));
    }
}
