use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::locale::Locale;
use crate::phase::Phase;
use crate::state::claim::{Contradiction, CrossDomainAnalogy, ProblemReframing, RoundClaim};

/// Maximum number of SYNTHESIZE→VALIDATE→BUILD rounds per session.
pub const MAX_ROUNDS: usize = 5;
/// Maximum claims a single round may add to `current_round_claims`.
pub const MAX_CLAIMS_PER_ROUND: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assumption {
    pub text: String,
    pub source: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub selected_option: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorphologicalBox {
    pub parameters: Vec<MorphologicalParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorphologicalParameter {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjacentPossible {
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeGraphNode {
    pub claim_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeGraphEdge {
    pub source_claim_id: String,
    pub target_claim_id: String,
    pub edge_type: crate::state::claim::EdgeType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchEntry {
    pub query: String,
    pub purpose: String,
    pub phase: Phase,
    pub summary: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchDirective {
    pub directive_type: String,
    pub query: String,
    pub domain: Option<String>,
}

/// A web search performed this phase. Reset on every phase transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchLog {
    pub query: String,
    pub summary: String,
}

/// Per-session, in-memory state authoritative for the duration of a turn.
/// Restored from (and written back to) a snapshot at pause/resume
/// boundaries — see [`crate::state::snapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeState {
    // Phase tracking
    pub current_phase: Phase,
    pub current_round: usize,

    // Locale
    pub locale: Locale,
    pub locale_confidence: f64,

    // Phase 1: DECOMPOSE
    pub fundamentals: Vec<String>,
    pub state_of_art_researched: bool,
    pub assumptions: Vec<Assumption>,
    pub reframings: Vec<ProblemReframing>,

    // Phase 2: EXPLORE
    pub morphological_box: Option<MorphologicalBox>,
    pub cross_domain_analogies: Vec<CrossDomainAnalogy>,
    pub cross_domain_search_count: u32,
    pub contradictions: Vec<Contradiction>,
    pub adjacent_possible: Vec<AdjacentPossible>,

    // Phase 3: SYNTHESIZE (per round)
    pub current_round_claims: Vec<RoundClaim>,
    pub antitheses_searched: BTreeSet<usize>,
    pub falsification_attempted: BTreeSet<usize>,
    pub novelty_checked: BTreeSet<usize>,

    // Phase 5: the cumulative graph
    pub knowledge_graph_nodes: Vec<KnowledgeGraphNode>,
    pub knowledge_graph_edges: Vec<KnowledgeGraphEdge>,
    pub negative_knowledge: Vec<String>,
    pub gaps: Vec<String>,
    pub negative_knowledge_consulted: bool,
    pub previous_claims_referenced: bool,

    // Phase 6: CRYSTALLIZE
    pub knowledge_document_markdown: Option<String>,

    // Working document
    pub working_document: HashMap<String, String>,
    pub document_updated_this_phase: bool,

    // Research archive (cumulative; see DESIGN.md for the pruning decision)
    pub research_archive: Vec<ResearchEntry>,
    pub research_tokens_used: u64,

    // Research directives (ephemeral queue)
    pub research_directives: Vec<ResearchDirective>,

    // Web-search log, reset on phase transition
    pub web_searches_this_phase: Vec<WebSearchLog>,

    // Pause state
    pub awaiting_user_input: bool,
    pub awaiting_input_type: Option<String>,

    // Deep-dive
    pub deep_dive_active: bool,
    pub deep_dive_target_claim_id: Option<String>,

    // Transient — excluded from snapshots
    #[serde(skip)]
    pub cancelled: bool,
}

impl Default for ForgeState {
    fn default() -> Self {
        Self {
            current_phase: Phase::Decompose,
            current_round: 0,
            locale: Locale::En,
            locale_confidence: 1.0,
            fundamentals: Vec::new(),
            state_of_art_researched: false,
            assumptions: Vec::new(),
            reframings: Vec::new(),
            morphological_box: None,
            cross_domain_analogies: Vec::new(),
            cross_domain_search_count: 0,
            contradictions: Vec::new(),
            adjacent_possible: Vec::new(),
            current_round_claims: Vec::new(),
            antitheses_searched: BTreeSet::new(),
            falsification_attempted: BTreeSet::new(),
            novelty_checked: BTreeSet::new(),
            knowledge_graph_nodes: Vec::new(),
            knowledge_graph_edges: Vec::new(),
            negative_knowledge: Vec::new(),
            gaps: Vec::new(),
            negative_knowledge_consulted: false,
            previous_claims_referenced: false,
            knowledge_document_markdown: None,
            working_document: HashMap::new(),
            document_updated_this_phase: false,
            research_archive: Vec::new(),
            research_tokens_used: 0,
            research_directives: Vec::new(),
            web_searches_this_phase: Vec::new(),
            awaiting_user_input: false,
            awaiting_input_type: None,
            deep_dive_active: false,
            deep_dive_target_claim_id: None,
            cancelled: false,
        }
    }
}

impl ForgeState {
    /// Move to a new phase, resetting the per-phase web-search log and the
    /// working-document completion flag.
    pub fn transition_to(&mut self, phase: Phase) {
        self.current_phase = phase;
        self.web_searches_this_phase.clear();
        self.document_updated_this_phase = false;
    }

    /// Advance to the next SYNTHESIZE round. Clears the claim buffer and
    /// all per-round validation sets; preserves the cumulative graph and
    /// negative-knowledge list.
    pub fn reset_for_new_round(&mut self) {
        self.current_round += 1;
        self.current_round_claims.clear();
        self.antitheses_searched.clear();
        self.falsification_attempted.clear();
        self.novelty_checked.clear();
        self.negative_knowledge_consulted = false;
        self.previous_claims_referenced = false;
        self.web_searches_this_phase.clear();
    }

    pub fn record_web_search(&mut self, query: impl Into<String>, summary: impl Into<String>) {
        self.web_searches_this_phase.push(WebSearchLog {
            query: query.into(),
            summary: summary.into(),
        });
    }

    pub fn add_research_directive(&mut self, directive: ResearchDirective) {
        self.research_directives.push(directive);
    }

    /// Drain and return all queued research directives.
    pub fn consume_research_directives(&mut self) -> Vec<ResearchDirective> {
        std::mem::take(&mut self.research_directives)
    }

    // ── Derived properties ──────────────────────────────────────────

    pub fn claims_in_round(&self) -> usize {
        self.current_round_claims.len()
    }

    pub fn claims_remaining(&self) -> usize {
        MAX_CLAIMS_PER_ROUND.saturating_sub(self.claims_in_round())
    }

    pub fn has_web_search_this_phase(&self) -> bool {
        !self.web_searches_this_phase.is_empty()
    }

    pub fn resonant_analogies(&self) -> Vec<&CrossDomainAnalogy> {
        self.cross_domain_analogies.iter().filter(|a| a.resonated).collect()
    }

    pub fn selected_reframings(&self) -> Vec<&ProblemReframing> {
        self.reframings.iter().filter(|r| r.selected.is_some()).collect()
    }

    pub fn reviewed_assumptions(&self) -> Vec<&Assumption> {
        self.assumptions.iter().filter(|a| a.selected_option.is_some()).collect()
    }

    pub fn all_claims_have_antithesis(&self) -> bool {
        (0..self.current_round_claims.len()).all(|i| self.antitheses_searched.contains(&i))
    }

    pub fn all_claims_falsified(&self) -> bool {
        (0..self.current_round_claims.len()).all(|i| self.falsification_attempted.contains(&i))
    }

    pub fn all_claims_novelty_checked(&self) -> bool {
        (0..self.current_round_claims.len()).all(|i| self.novelty_checked.contains(&i))
    }

    pub fn max_rounds_reached(&self) -> bool {
        self.current_round >= MAX_ROUNDS - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_remaining_counts_down_from_three() {
        let mut state = ForgeState::default();
        assert_eq!(state.claims_remaining(), 3);
        state.current_round_claims.push(sample_claim());
        assert_eq!(state.claims_remaining(), 2);
    }

    #[test]
    fn transition_to_clears_phase_scoped_state() {
        let mut state = ForgeState::default();
        state.record_web_search("q", "s");
        state.document_updated_this_phase = true;
        state.transition_to(Phase::Explore);
        assert_eq!(state.current_phase, Phase::Explore);
        assert!(!state.has_web_search_this_phase());
        assert!(!state.document_updated_this_phase);
    }

    #[test]
    fn reset_for_new_round_preserves_the_graph() {
        let mut state = ForgeState::default();
        state.current_round_claims.push(sample_claim());
        state.antitheses_searched.insert(0);
        state.knowledge_graph_nodes.push(KnowledgeGraphNode {
            claim_id: "c1".into(),
            status: "validated".into(),
        });
        state.reset_for_new_round();
        assert_eq!(state.current_round, 1);
        assert!(state.current_round_claims.is_empty());
        assert!(state.antitheses_searched.is_empty());
        assert_eq!(state.knowledge_graph_nodes.len(), 1);
    }

    #[test]
    fn max_rounds_reached_at_round_four() {
        let mut state = ForgeState::default();
        state.current_round = 3;
        assert!(!state.max_rounds_reached());
        state.current_round = 4;
        assert!(state.max_rounds_reached());
    }

    fn sample_claim() -> RoundClaim {
        RoundClaim {
            claim_id: "c1".into(),
            claim_text: "text".into(),
            thesis_text: "thesis".into(),
            antithesis_text: "antithesis".into(),
            falsifiability_condition: "cond".into(),
            confidence: 0.5,
            evidence: Vec::new(),
            builds_on_claim_id: None,
            resonance_options: Vec::new(),
            verdict: None,
            qualification: None,
            scores: None,
        }
    }
}
