//! Phase digests — compact, human-readable summaries of a session's
//! accumulated state, folded into the system prompt so the model doesn't
//! need the full `ForgeState` JSON (or the whole research archive) on
//! every turn.
//!
//! Two digests: [`build_phase_digest`] summarizes what the *current phase*
//! has produced so far; [`build_research_digest`] summarizes what research
//! has already been done, scoped to the current phase and capped so a long
//! session's archive doesn't dominate the prompt.

use forge_domain::phase::Phase;
use forge_domain::state::forge_state::ForgeState;

/// Research entries shown per phase before older ones are elided.
const MAX_RESEARCH_ENTRIES: usize = 6;

/// Summarize what the current phase has accumulated: fundamentals and
/// reframings in DECOMPOSE, the morphological box and analogies in
/// EXPLORE, claims in SYNTHESIZE/VALIDATE, and so on. Empty string when
/// there's nothing yet worth summarizing (a fresh phase).
pub fn build_phase_digest(state: &ForgeState) -> String {
    let mut lines = Vec::new();

    match state.current_phase {
        Phase::Decompose => {
            if !state.fundamentals.is_empty() {
                lines.push(format!("Fundamentals decomposed so far: {}", state.fundamentals.join("; ")));
            }
            if !state.assumptions.is_empty() {
                lines.push(format!("{} assumptions surfaced, {} reviewed", state.assumptions.len(), state.reviewed_assumptions().len()));
            }
            if !state.reframings.is_empty() {
                lines.push(format!("{} reframings proposed, {} selected", state.reframings.len(), state.selected_reframings().len()));
            }
        }
        Phase::Explore => {
            if let Some(mbox) = &state.morphological_box {
                lines.push(format!("Morphological box: {} parameters", mbox.parameters.len()));
            }
            if !state.cross_domain_analogies.is_empty() {
                lines.push(format!(
                    "{} cross-domain analogies ({} resonated)",
                    state.cross_domain_analogies.len(),
                    state.resonant_analogies().len()
                ));
            }
            if !state.contradictions.is_empty() {
                lines.push(format!("{} contradictions identified", state.contradictions.len()));
            }
        }
        Phase::Synthesize | Phase::Validate => {
            lines.push(format!("Round {}: {} claim(s) this round", state.current_round, state.claims_in_round()));
            for (i, claim) in state.current_round_claims.iter().enumerate() {
                let antithesis = if state.antitheses_searched.contains(&i) { "antithesis found" } else { "antithesis pending" };
                lines.push(format!("  [{i}] {} ({antithesis})", claim.claim_text));
            }
        }
        Phase::Build => {
            lines.push(format!(
                "Knowledge graph: {} nodes, {} edges, {} gaps",
                state.knowledge_graph_nodes.len(),
                state.knowledge_graph_edges.len(),
                state.gaps.len()
            ));
        }
        Phase::Crystallize => {
            if state.knowledge_document_markdown.is_some() {
                lines.push("Knowledge document drafted.".to_string());
            }
        }
    }

    if !state.negative_knowledge.is_empty() {
        lines.push(format!("{} negative-knowledge entries on record", state.negative_knowledge.len()));
    }

    lines.join("\n")
}

/// Summarize research performed this phase and, more briefly, the most
/// recent research from earlier phases — capped at
/// [`MAX_RESEARCH_ENTRIES`] so a long archive doesn't dominate the prompt.
pub fn build_research_digest(state: &ForgeState) -> String {
    if state.research_archive.is_empty() {
        return String::new();
    }

    let mut this_phase: Vec<&forge_domain::state::forge_state::ResearchEntry> = state
        .research_archive
        .iter()
        .filter(|e| e.phase == state.current_phase)
        .collect();
    this_phase.reverse();

    let mut other_phase: Vec<&forge_domain::state::forge_state::ResearchEntry> = state
        .research_archive
        .iter()
        .filter(|e| e.phase != state.current_phase)
        .collect();
    other_phase.reverse();

    let mut lines = Vec::new();
    for entry in this_phase.iter().take(MAX_RESEARCH_ENTRIES) {
        lines.push(format!("- [{}] \"{}\": {}", entry.purpose, entry.query, entry.summary));
    }
    let remaining = MAX_RESEARCH_ENTRIES.saturating_sub(this_phase.len().min(MAX_RESEARCH_ENTRIES));
    for entry in other_phase.iter().take(remaining) {
        lines.push(format!("- [{} / {}] \"{}\": {}", entry.phase, entry.purpose, entry.query, entry.summary));
    }

    if lines.is_empty() {
        String::new()
    } else {
        format!("Prior research:\n{}", lines.join("\n"))
    }
}
