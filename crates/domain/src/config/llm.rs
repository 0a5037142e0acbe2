use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider system
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Two model roles only: `primary_model` drives the main turn loop,
// `research_model` is the cheaper model the research sub-agent delegates
// to. Unlike the capability-routed registry this is descended from, there
// is no classifier or tier table — the session never needs more than
// these two roles.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "provider_id/model_name" used for the main agent loop.
    #[serde(default = "d_primary_model")]
    pub primary_model: String,
    /// "provider_id/model_name" used by the research sub-agent.
    /// Falls back to `primary_model` when empty.
    #[serde(default)]
    pub research_model: String,
    #[serde(default = "d_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default = "d_max_retries")]
    pub max_retries: u32,
    /// Startup policy for LLM providers.
    #[serde(default)]
    pub startup_policy: LlmStartupPolicy,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            primary_model: d_primary_model(),
            research_model: String::new(),
            default_timeout_ms: d_timeout_ms(),
            max_retries: d_max_retries(),
            startup_policy: LlmStartupPolicy::AllowNone,
            providers: Vec::new(),
        }
    }
}

impl LlmConfig {
    /// The model used for research delegation, falling back to the primary
    /// model when no dedicated research model is configured.
    pub fn effective_research_model(&self) -> &str {
        if self.research_model.trim().is_empty() {
            &self.primary_model
        } else {
            &self.research_model
        }
    }
}

/// Controls how the gateway handles LLM provider initialization at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmStartupPolicy {
    /// Gateway boots even if no LLM providers initialize; requests that
    /// need a provider fail until credentials are configured.
    #[default]
    AllowNone,
    /// Abort startup if no LLM providers successfully initialize.
    RequireOne,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub kind: ProviderKind,
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Anthropic,
    OpenaiCompat,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    /// Env var containing the key.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer `env`).
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    ApiKey,
    None,
}

// ── serde default helpers ───────────────────────────────────────────

fn d_primary_model() -> String {
    "anthropic/claude-sonnet-4-20250514".into()
}
fn d_timeout_ms() -> u64 {
    300_000
}
fn d_max_retries() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_model_falls_back_to_primary() {
        let config = LlmConfig::default();
        assert_eq!(config.effective_research_model(), config.primary_model);
    }

    #[test]
    fn research_model_used_when_set() {
        let mut config = LlmConfig::default();
        config.research_model = "anthropic/claude-haiku-4-20250514".into();
        assert_eq!(config.effective_research_model(), "anthropic/claude-haiku-4-20250514");
    }
}
