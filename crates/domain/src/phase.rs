use serde::{Deserialize, Serialize};
use std::fmt;

/// The six-stage pipeline every session walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Decompose,
    Explore,
    Synthesize,
    Validate,
    Build,
    Crystallize,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Decompose => "decompose",
            Phase::Explore => "explore",
            Phase::Synthesize => "synthesize",
            Phase::Validate => "validate",
            Phase::Build => "build",
            Phase::Crystallize => "crystallize",
        }
    }

    /// The phase that immediately precedes this one in the forward pipeline.
    /// `None` for `Decompose`. `Build` loops back to `Synthesize` for
    /// subsequent rounds rather than advancing past `Crystallize` directly;
    /// that loop is runner logic, not captured here.
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Decompose => Some(Phase::Explore),
            Phase::Explore => Some(Phase::Synthesize),
            Phase::Synthesize => Some(Phase::Validate),
            Phase::Validate => Some(Phase::Build),
            Phase::Build => Some(Phase::Crystallize),
            Phase::Crystallize => None,
        }
    }

    /// The working-document completion gate is exempted for CRYSTALLIZE
    /// (its own document write IS the phase's output, not a precondition
    /// for leaving it).
    pub fn requires_document_gate(&self) -> bool {
        !matches!(self, Phase::Crystallize)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session lifecycle status, persisted alongside the ForgeState snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Decomposing,
    Exploring,
    Synthesizing,
    Validating,
    Building,
    Crystallized,
    Cancelled,
}

impl From<Phase> for SessionStatus {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Decompose => SessionStatus::Decomposing,
            Phase::Explore => SessionStatus::Exploring,
            Phase::Synthesize => SessionStatus::Synthesizing,
            Phase::Validate => SessionStatus::Validating,
            Phase::Build => SessionStatus::Building,
            Phase::Crystallize => SessionStatus::Crystallized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crystallize_has_no_next_phase() {
        assert_eq!(Phase::Crystallize.next(), None);
    }

    #[test]
    fn only_crystallize_is_exempt_from_the_document_gate() {
        assert!(Phase::Build.requires_document_gate());
        assert!(!Phase::Crystallize.requires_document_gate());
    }
}
