use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Durable claim-graph rows
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A knowledge claim, persisted independent of the live ForgeState.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeClaim {
    pub id: String,
    pub session_id: String,
    pub claim_text: String,
    pub thesis_text: String,
    pub antithesis_text: String,
    pub phase_created: String,
    pub round_created: usize,
    pub status: ClaimStatus,
    pub confidence: f64,
    pub falsifiability_condition: String,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub scores: Option<ClaimScores>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Proposed,
    Validated,
    Qualified,
    Rejected,
    Superseded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClaimScores {
    pub novelty: f64,
    pub groundedness: f64,
    pub falsifiability: f64,
    pub significance: f64,
}

/// Supporting or contradicting evidence attached to a claim. Immutable
/// once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub id: String,
    pub claim_id: String,
    pub session_id: String,
    pub url: String,
    pub title: String,
    pub summary: String,
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    pub contributed_by: ContributedBy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Supporting,
    Contradicting,
    Contextual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributedBy {
    Agent,
    User,
}

/// An edge in the cumulative knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimEdge {
    pub id: String,
    pub session_id: String,
    pub source_claim_id: String,
    pub target_claim_id: String,
    pub edge_type: EdgeType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Supports,
    Contradicts,
    Extends,
    Supersedes,
    DependsOn,
    MergedFrom,
}

/// The user's judgment on a claim, submitted during a `verdicts` review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accept,
    Reject,
    Qualify,
    Merge,
}

impl Verdict {
    /// Only `accept`/`qualify` verdicts admit a claim into the knowledge
    /// graph (§3 invariant: every graphed claim has one of these two).
    pub fn admits_to_graph(&self) -> bool {
        matches!(self, Verdict::Accept | Verdict::Qualify)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-ForgeState round-scoped claim (pre-persistence)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A claim still being built up this round, before a verdict admits (or
/// rejects) it into the durable graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundClaim {
    pub claim_id: String,
    pub claim_text: String,
    pub thesis_text: String,
    pub antithesis_text: String,
    pub falsifiability_condition: String,
    pub confidence: f64,
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub builds_on_claim_id: Option<String>,
    #[serde(default)]
    pub resonance_options: Vec<String>,
    #[serde(default)]
    pub verdict: Option<Verdict>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub scores: Option<ClaimScores>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Projections mirrored from ForgeState (cross-session inspection)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemReframing {
    pub text: String,
    #[serde(rename = "type")]
    pub reframing_type: String,
    pub reasoning: String,
    pub resonance_options: Vec<String>,
    #[serde(default)]
    pub selected: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossDomainAnalogy {
    pub domain: String,
    pub description: String,
    pub semantic_distance: f64,
    pub resonance_options: Vec<String>,
    #[serde(default)]
    pub resonated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contradiction {
    pub property_a: String,
    pub property_b: String,
    pub description: String,
}
