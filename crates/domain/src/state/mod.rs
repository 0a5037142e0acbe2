pub mod claim;
pub mod enforce;
pub mod forge_state;
pub mod snapshot;

pub use claim::{
    ClaimEdge, ClaimScores, ClaimStatus, ContributedBy, Contradiction, CrossDomainAnalogy,
    EdgeType, Evidence, EvidenceType, KnowledgeClaim, ProblemReframing, RoundClaim, Verdict,
};
pub use forge_state::{
    AdjacentPossible, Assumption, ForgeState, KnowledgeGraphEdge, KnowledgeGraphNode,
    MorphologicalBox, MorphologicalParameter, ResearchDirective, ResearchEntry, WebSearchLog,
    MAX_CLAIMS_PER_ROUND, MAX_ROUNDS,
};
