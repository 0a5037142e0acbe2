use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session limits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Hard cap on DECOMPOSE→CRYSTALLIZE rounds before a session is forced
    /// to terminate with `MAX_ROUNDS_EXCEEDED`.
    #[serde(default = "d_max_rounds")]
    pub max_rounds: usize,
    /// Maximum claims accepted into a session's claim graph in a single
    /// round before `CLAIM_LIMIT_EXCEEDED`.
    #[serde(default = "d_max_claims_per_round")]
    pub max_claims_per_round: usize,
    /// Idle duration after which a session is eligible for eviction from
    /// the in-memory session-lock table (the durable record is unaffected).
    #[serde(default = "d_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_rounds: d_max_rounds(),
            max_claims_per_round: d_max_claims_per_round(),
            idle_timeout_secs: d_idle_timeout_secs(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_max_rounds() -> usize {
    5
}
fn d_max_claims_per_round() -> usize {
    3
}
fn d_idle_timeout_secs() -> u64 {
    1800
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_round_budget() {
        let config = SessionsConfig::default();
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.max_claims_per_round, 3);
    }
}
