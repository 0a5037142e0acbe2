use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Compaction
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Compaction collapses old turns, tool results, and web-search payloads
// out of the prompt so the context window doesn't overflow over a
// multi-round session. Three independent thresholds, one per target.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactionConfig {
    /// Enable automatic compaction once `turn_threshold` is exceeded.
    #[serde(default = "d_true")]
    pub auto: bool,
    /// Turn count above which middle-turn compaction triggers.
    #[serde(default = "d_turn_threshold")]
    pub turn_threshold: usize,
    /// Turns kept verbatim (most recent) after middle-turn compaction.
    #[serde(default = "d_keep_last_turns")]
    pub keep_last_turns: usize,
    /// Tool-result turns kept verbatim; older ones are replaced with a
    /// one-line placeholder.
    #[serde(default = "d_keep_last_tool_results")]
    pub keep_last_tool_results: usize,
    /// Web-search result turns kept verbatim; older ones are trimmed to
    /// titles and URLs only.
    #[serde(default = "d_keep_last_web_results")]
    pub keep_last_web_results: usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            auto: true,
            turn_threshold: d_turn_threshold(),
            keep_last_turns: d_keep_last_turns(),
            keep_last_tool_results: d_keep_last_tool_results(),
            keep_last_web_results: d_keep_last_web_results(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_true() -> bool {
    true
}
fn d_turn_threshold() -> usize {
    20
}
fn d_keep_last_turns() -> usize {
    8
}
fn d_keep_last_tool_results() -> usize {
    6
}
fn d_keep_last_web_results() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_fewer_turns_than_the_trigger_threshold() {
        let config = CompactionConfig::default();
        assert!(config.keep_last_turns < config.turn_threshold);
    }
}
