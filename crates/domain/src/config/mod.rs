mod compaction;
mod llm;
mod server;
mod sessions;
mod storage;

pub use compaction::CompactionConfig;
pub use llm::{AuthConfig, AuthMode, LlmConfig, LlmStartupPolicy, ProviderConfig, ProviderKind};
pub use server::{CorsConfig, ServerConfig};
pub use sessions::SessionsConfig;
pub use storage::StorageConfig;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Aggregated application configuration, loaded from `forge.toml` with
/// environment-variable overrides layered on top (see `Config::load`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub compaction: CompactionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load from an optional TOML file, then apply environment overrides.
    /// A missing file is not an error — defaults plus env vars still apply.
    pub fn load(path: Option<&std::path::Path>) -> crate::error::Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p)?;
                toml::from_str(&raw)
                    .map_err(|e| crate::error::Error::Config(format!("parsing {}: {e}", p.display())))?
            }
            _ => Config::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("FORGE_SERVER_PORT") {
            if let Ok(p) = v.parse() {
                self.server.port = p;
            }
        }
        if let Ok(v) = std::env::var("FORGE_CORS_ORIGINS") {
            self.server.cors.allowed_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = std::env::var("FORGE_LLM_PRIMARY_MODEL") {
            self.llm.primary_model = v;
        }
        if let Ok(v) = std::env::var("FORGE_LLM_RESEARCH_MODEL") {
            self.llm.research_model = v;
        }
        if let Ok(v) = std::env::var("FORGE_LLM_MAX_RETRIES") {
            if let Ok(n) = v.parse() {
                self.llm.max_retries = n;
            }
        }
        if let Ok(v) = std::env::var("FORGE_LLM_TIMEOUT_MS") {
            if let Ok(n) = v.parse() {
                self.llm.default_timeout_ms = n;
            }
        }
        if let Ok(v) = std::env::var("FORGE_SESSION_MAX_ROUNDS") {
            if let Ok(n) = v.parse() {
                self.sessions.max_rounds = n;
            }
        }
        if let Ok(v) = std::env::var("FORGE_STATE_DIR") {
            self.storage.state_dir = v.into();
        }
        if let Ok(v) = std::env::var("FORGE_LOG_LEVEL") {
            self.server.log_level = v;
        }
        if let Ok(v) = std::env::var("FORGE_LOG_FORMAT") {
            self.server.log_format = v;
        }
    }

    /// Validate the configuration. Returns every problem found rather than
    /// failing on the first — callers decide whether any `Error`-severity
    /// entry should abort startup.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "port must be nonzero".into(),
            });
        }
        if self.server.host.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.host".into(),
                message: "host must not be empty".into(),
            });
        }
        if self.server.cors.allowed_origins.iter().any(|o| o == "*") {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "server.cors.allowed_origins".into(),
                message: "wildcard origin allows any site to call this API".into(),
            });
        }

        if self.llm.primary_model.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "llm.primary_model".into(),
                message: "primary model must be configured".into(),
            });
        }
        if self.llm.research_model.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "llm.research_model".into(),
                message: "no research model configured; research delegation will use the primary model".into(),
            });
        }
        if self.llm.max_retries == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "llm.max_retries".into(),
                message: "max_retries is zero; transient provider errors will not be retried".into(),
            });
        }
        for pc in &self.llm.providers {
            if pc.id.trim().is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: "llm.providers[].id".into(),
                    message: "provider id must not be empty".into(),
                });
            }
            if !pc.base_url.starts_with("http://") && !pc.base_url.starts_with("https://") {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("llm.providers[{}].base_url", pc.id),
                    message: "base_url must start with http:// or https://".into(),
                });
            }
        }
        let mut seen_ids = std::collections::HashSet::new();
        for pc in &self.llm.providers {
            if !seen_ids.insert(pc.id.clone()) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: "llm.providers[].id".into(),
                    message: format!("duplicate provider id '{}'", pc.id),
                });
            }
        }

        if self.sessions.max_rounds == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "sessions.max_rounds".into(),
                message: "max_rounds must be at least 1".into(),
            });
        }

        if self.compaction.keep_last_turns == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "compaction.keep_last_turns".into(),
                message: "keeping zero turns verbatim after compaction loses all recent context".into(),
            });
        }

        errors
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_clean() {
        let config = Config::default();
        let errors = config.validate();
        assert!(errors.iter().all(|e| e.severity == ConfigSeverity::Warning) || errors.is_empty());
    }

    #[test]
    fn zero_port_is_an_error() {
        let mut config = Config::default();
        config.server.port = 0;
        let errors = config.validate();
        assert!(errors
            .iter()
            .any(|e| e.field == "server.port" && e.severity == ConfigSeverity::Error));
    }

    #[test]
    fn wildcard_cors_is_a_warning_not_an_error() {
        let mut config = Config::default();
        config.server.cors.allowed_origins = vec!["*".into()];
        let errors = config.validate();
        assert!(errors
            .iter()
            .any(|e| e.field.contains("cors") && e.severity == ConfigSeverity::Warning));
    }

    #[test]
    fn zero_max_rounds_is_an_error() {
        let mut config = Config::default();
        config.sessions.max_rounds = 0;
        let errors = config.validate();
        assert!(errors
            .iter()
            .any(|e| e.field == "sessions.max_rounds" && e.severity == ConfigSeverity::Error));
    }

    #[test]
    fn duplicate_provider_ids_rejected() {
        let mut config = Config::default();
        config.llm.providers = vec![
            ProviderConfig {
                id: "anthropic".into(),
                kind: ProviderKind::Anthropic,
                base_url: "https://api.anthropic.com".into(),
                auth: AuthConfig::default(),
                default_model: None,
            },
            ProviderConfig {
                id: "anthropic".into(),
                kind: ProviderKind::Anthropic,
                base_url: "https://api.anthropic.com".into(),
                auth: AuthConfig::default(),
                default_model: None,
            },
        ];
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.message.contains("duplicate")));
    }
}
