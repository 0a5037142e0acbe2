//! `AppState` construction, extracted from `main.rs` so CLI and HTTP
//! entry points share one boot path.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use parking_lot::RwLock;

use forge_domain::config::{Config, ConfigSeverity};
use forge_providers::ProviderRegistry;
use forge_sessions::{ClaimsStore, SessionStore};

use crate::runtime::cancel::CancelMap;
use crate::runtime::session_lock::SessionLockMap;
use crate::runtime::translate::{IdentityTranslator, LlmTranslator, Translator};
use crate::state::AppState;

/// Validate config, initialize every subsystem, and return a fully-wired
/// [`AppState`]. Shared by the `serve` and `chat` CLI commands.
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues.iter().filter(|i| i.severity == ConfigSeverity::Error).count()
        );
    }

    let providers = Arc::new(
        ProviderRegistry::from_config(&config.llm).context("initializing LLM providers")?,
    );
    if providers.is_empty() {
        tracing::warn!("no LLM providers initialized — sessions cannot run until one is configured");
    } else {
        tracing::info!(providers = providers.len(), roles = ?providers.list_roles(), "LLM provider registry ready");
    }
    for err in providers.init_errors() {
        tracing::warn!(provider_id = %err.provider_id, kind = %err.kind, error = %err.error, "provider failed to initialize");
    }

    let sessions = Arc::new(
        SessionStore::new(&config.storage.state_dir).context("initializing session store")?,
    );
    let claims = Arc::new(
        ClaimsStore::new(&config.storage.state_dir).context("initializing claims store")?,
    );
    tracing::info!(path = %config.storage.state_dir.display(), "session + claims stores ready");

    let session_locks = Arc::new(SessionLockMap::new());
    let cancel_map = Arc::new(CancelMap::new());

    let translator: Arc<dyn Translator> = match providers.for_role("primary") {
        Some(provider) => {
            let model = providers.model_for_role("primary").map(str::to_string);
            Arc::new(LlmTranslator::new(provider, model))
        }
        None => Arc::new(IdentityTranslator),
    };

    Ok(AppState {
        config,
        providers,
        sessions,
        claims,
        live_states: Arc::new(RwLock::new(HashMap::new())),
        session_locks,
        cancel_map,
        translator,
    })
}
