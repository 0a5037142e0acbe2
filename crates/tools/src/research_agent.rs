//! `ResearchSubAgent`: delegates a focused web query to a cheaper model.
//!
//! The sub-agent runs its own short tool-calling loop against the vendor's
//! native server-side web-search tool (reached through the same
//! [`forge_providers::LlmProvider`] trait the primary model uses — this
//! type depends on no separate HTTP client), then parses whatever text the
//! model settled on into a normalized result. It never raises: any failure
//! along the way degrades to an empty result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use forge_domain::tool::{Message, ToolDefinition};
use forge_providers::{ChatRequest, LlmProvider};

const MAX_ITERATIONS: usize = 3;

/// What the caller is trying to learn; shapes the sub-agent's system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchPurpose {
    StateOfArt,
    EvidenceFor,
    EvidenceAgainst,
    CrossDomain,
    NoveltyCheck,
    Falsification,
}

impl ResearchPurpose {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "state_of_art" => Some(Self::StateOfArt),
            "evidence_for" => Some(Self::EvidenceFor),
            "evidence_against" => Some(Self::EvidenceAgainst),
            "cross_domain" => Some(Self::CrossDomain),
            "novelty_check" => Some(Self::NoveltyCheck),
            "falsification" => Some(Self::Falsification),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StateOfArt => "state_of_art",
            Self::EvidenceFor => "evidence_for",
            Self::EvidenceAgainst => "evidence_against",
            Self::CrossDomain => "cross_domain",
            Self::NoveltyCheck => "novelty_check",
            Self::Falsification => "falsification",
        }
    }

    /// The `<role>` clause of the per-purpose instruction template.
    fn role(&self) -> &'static str {
        match self {
            Self::StateOfArt => "surveying the current state of the art in a domain",
            Self::EvidenceFor => "finding the strongest evidence supporting a claim",
            Self::EvidenceAgainst => "finding the strongest evidence contradicting a claim",
            Self::CrossDomain => "finding an analogous mechanism in a different domain",
            Self::NoveltyCheck => "checking whether a claim is already known",
            Self::Falsification => "trying to falsify a claim",
        }
    }
}

/// Normalized research output, regardless of which fallback produced it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResearchResult {
    pub summary: String,
    #[serde(default)]
    pub sources: Vec<String>,
    pub result_count: usize,
    pub empty: bool,
    pub haiku_tokens: u64,
}

impl ResearchResult {
    fn empty() -> Self {
        Self { summary: String::new(), sources: Vec::new(), result_count: 0, empty: true, haiku_tokens: 0 }
    }
}

pub struct ResearchSubAgent {
    provider: Arc<dyn LlmProvider>,
    model: Option<String>,
}

impl ResearchSubAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, model: Option<String>) -> Self {
        Self { provider, model }
    }

    fn system_prompt(purpose: ResearchPurpose) -> String {
        format!(
            "<role>You are a research assistant {}.</role>\n\
             <rules>Search first. Use only facts found in search results. Never fabricate URLs or invent findings. \
             If search yields nothing relevant, say so plainly.</rules>\n\
             <output_format>Respond with a single JSON object: \
             {{\"summary\": string, \"sources\": [string], \"result_count\": integer}}.</output_format>\n\
             <search_strategy>Issue at most one search before answering; prefer precise, narrow queries.</search_strategy>",
            purpose.role()
        )
    }

    fn web_search_tool() -> ToolDefinition {
        ToolDefinition {
            name: "web_search".to_string(),
            description: "Search the web for current information.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"],
            }),
        }
    }

    /// Runs the bounded tool-calling loop and normalizes the result.
    /// Never returns an error — any failure degrades to an empty result.
    pub async fn run(&self, query: &str, purpose: ResearchPurpose, instructions: Option<&str>) -> ResearchResult {
        let mut user_text = format!("Query: {query}\nPurpose: {}", purpose.as_str());
        if let Some(extra) = instructions {
            user_text.push_str(&format!("\nAdditional instructions: {extra}"));
        }

        let mut messages = vec![Message::system(Self::system_prompt(purpose)), Message::user(user_text)];
        let mut haiku_tokens: u64 = 0;
        let mut final_text = String::new();

        for _ in 0..MAX_ITERATIONS {
            let req = ChatRequest {
                messages: messages.clone(),
                tools: vec![Self::web_search_tool()],
                temperature: Some(0.0),
                max_tokens: Some(1024),
                json_mode: false,
                model: self.model.clone(),
            };
            let response = match self.provider.chat(req).await {
                Ok(r) => r,
                Err(_) => return ResearchResult::empty(),
            };
            haiku_tokens += response.usage.as_ref().map(|u| u.total_tokens as u64).unwrap_or(0);
            final_text = response.content.clone();

            let still_searching = response.finish_reason.as_deref() == Some("pause_turn") || !response.tool_calls.is_empty();
            messages.push(Message::assistant(response.content));
            if !still_searching {
                break;
            }
        }

        let mut result = Self::parse_result(&final_text).unwrap_or_else(ResearchResult::empty);
        result.haiku_tokens = haiku_tokens;
        if result.summary.is_empty() && result.sources.is_empty() {
            result.empty = true;
        }
        result
    }

    /// Three-level fallback: direct JSON, a regex-extracted JSON block, or
    /// the raw text treated as the summary.
    fn parse_result(text: &str) -> Option<ResearchResult> {
        if let Ok(parsed) = serde_json::from_str::<Value>(text) {
            if let Some(r) = Self::from_value(&parsed) {
                return Some(r);
            }
        }
        if let Some(start) = text.find('{') {
            if let Some(end) = text.rfind('}') {
                if end > start {
                    if let Ok(parsed) = serde_json::from_str::<Value>(&text[start..=end]) {
                        if let Some(r) = Self::from_value(&parsed) {
                            return Some(r);
                        }
                    }
                }
            }
        }
        if text.trim().is_empty() {
            return None;
        }
        Some(ResearchResult {
            summary: text.trim().to_string(),
            sources: Vec::new(),
            result_count: 0,
            empty: false,
            haiku_tokens: 0,
        })
    }

    fn from_value(v: &Value) -> Option<ResearchResult> {
        let summary = v.get("summary")?.as_str()?.to_string();
        let sources: Vec<String> = v
            .get("sources")
            .and_then(|s| s.as_array())
            .map(|arr| arr.iter().filter_map(|s| s.as_str().map(String::from)).collect())
            .unwrap_or_default();
        let result_count = v.get("result_count").and_then(|c| c.as_u64()).unwrap_or(sources.len() as u64) as usize;
        Some(ResearchResult { summary, sources, result_count, empty: false, haiku_tokens: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_result_handles_direct_json() {
        let text = r#"{"summary": "found it", "sources": ["https://a.com"], "result_count": 1}"#;
        let result = ResearchSubAgent::parse_result(text).unwrap();
        assert_eq!(result.summary, "found it");
        assert_eq!(result.sources.len(), 1);
    }

    #[test]
    fn parse_result_extracts_json_block_from_surrounding_prose() {
        let text = "Here is what I found:\n{\"summary\": \"ok\", \"sources\": []}\nHope that helps.";
        let result = ResearchSubAgent::parse_result(text).unwrap();
        assert_eq!(result.summary, "ok");
    }

    #[test]
    fn parse_result_falls_back_to_raw_text() {
        let result = ResearchSubAgent::parse_result("just some plain text").unwrap();
        assert_eq!(result.summary, "just some plain text");
        assert!(!result.empty);
    }

    #[test]
    fn purpose_round_trips_through_parse_and_as_str() {
        for s in ["state_of_art", "evidence_for", "evidence_against", "cross_domain", "novelty_check", "falsification"] {
            let p = ResearchPurpose::parse(s).unwrap();
            assert_eq!(p.as_str(), s);
        }
    }
}
