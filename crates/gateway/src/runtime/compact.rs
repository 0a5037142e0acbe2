//! Pure, in-memory context compaction over a turn's `Vec<Message>`.
//!
//! Three independent, chained transforms — trim old tool results, compact
//! the middle of a long conversation, trim old web-search payloads — each
//! taking a deep copy and returning a new vector. None of these touch
//! [`forge_sessions::SessionStore`]; the runner calls `optimize_context`
//! against the in-memory history it's about to send, and only the *next*
//! turn's request is shaped by it — the persisted history is untouched.
//!
//! This operates over the provider-agnostic `Message` list the runner
//! assembles per turn, distinct from transcript-level compaction over
//! persisted rows.

use serde_json::Value;

use forge_domain::config::CompactionConfig;
use forge_domain::tool::{ContentPart, Message, MessageContent, Role};

/// Marks a synthesized summary pair so a second compaction pass over an
/// already-compacted history is a no-op.
const COMPACTION_MARKER: &str = "[[context-compacted]]";

/// Run all three compaction stages in sequence. Pure: never mutates
/// `messages`, always returns a fresh `Vec`.
pub fn optimize_context(messages: &[Message], config: &CompactionConfig) -> Vec<Message> {
    let trimmed_tool_results = trim_old_tool_results(messages.to_vec(), config.keep_last_tool_results);
    let compacted = compact_middle(trimmed_tool_results, config.turn_threshold, config.keep_last_turns);
    trim_old_web_search_results(compacted, config.keep_last_web_results)
}

/// Keep the most recent `keep_last` tool results verbatim; collapse older
/// ones to a one-line placeholder. The `tool_use_id` is untouched, so
/// tool_use/tool_result correlation survives the collapse.
fn trim_old_tool_results(mut messages: Vec<Message>, keep_last: usize) -> Vec<Message> {
    let mut locations: Vec<(usize, usize)> = Vec::new();
    for (mi, msg) in messages.iter().enumerate() {
        if let MessageContent::Parts(parts) = &msg.content {
            for (pi, part) in parts.iter().enumerate() {
                if matches!(part, ContentPart::ToolResult { .. }) {
                    locations.push((mi, pi));
                }
            }
        }
    }
    let cutoff = locations.len().saturating_sub(keep_last);
    for (mi, pi) in locations.into_iter().take(cutoff) {
        if let MessageContent::Parts(parts) = &mut messages[mi].content {
            if let ContentPart::ToolResult { content, is_error, .. } = &mut parts[pi] {
                *content = collapse_tool_result(content, *is_error);
            }
        }
    }
    messages
}

fn collapse_tool_result(content: &str, is_error: bool) -> String {
    if is_error {
        let code = serde_json::from_str::<Value>(content)
            .ok()
            .and_then(|v| v.get("error_code").and_then(|c| c.as_str().map(String::from)))
            .unwrap_or_else(|| "UNKNOWN".to_string());
        format!("[error:{code}]")
    } else {
        "[ok]".to_string()
    }
}

/// Above `threshold` messages, drop everything except the first user
/// message and the last `keep_last`, replacing the gap with a summary
/// assistant/user pair. Idempotent: a history that already carries the
/// marker is returned unchanged.
fn compact_middle(messages: Vec<Message>, threshold: usize, keep_last: usize) -> Vec<Message> {
    if messages.len() <= threshold {
        return messages;
    }
    if messages.iter().any(|m| m.content.extract_all_text().contains(COMPACTION_MARKER)) {
        return messages;
    }

    let first_user = messages.iter().find(|m| m.role == Role::User).cloned();
    let tail_start = messages.len().saturating_sub(keep_last);
    let tail = messages[tail_start..].to_vec();
    let dropped = messages.len() - tail.len() - first_user.is_some() as usize;

    let mut out = Vec::with_capacity(tail.len() + 3);
    if let Some(first) = first_user {
        out.push(first);
    }
    out.push(Message::assistant(format!(
        "{COMPACTION_MARKER} Summarizing {dropped} earlier turns to stay within the context window."
    )));
    out.push(Message::user("Continue working from the summary above.".to_string()));
    out.extend(tail);
    out
}

/// Keep the most recent `keep_last` research/web-search tool results
/// verbatim; older ones retain only their source list, dropping the
/// (often several-paragraph) summary text.
fn trim_old_web_search_results(mut messages: Vec<Message>, keep_last: usize) -> Vec<Message> {
    let mut locations: Vec<(usize, usize)> = Vec::new();
    for (mi, msg) in messages.iter().enumerate() {
        if let MessageContent::Parts(parts) = &msg.content {
            for (pi, part) in parts.iter().enumerate() {
                if let ContentPart::ToolResult { content, is_error, .. } = part {
                    if !is_error && is_web_search_result(content) {
                        locations.push((mi, pi));
                    }
                }
            }
        }
    }
    let cutoff = locations.len().saturating_sub(keep_last);
    for (mi, pi) in locations.into_iter().take(cutoff) {
        if let MessageContent::Parts(parts) = &mut messages[mi].content {
            if let ContentPart::ToolResult { content, .. } = &mut parts[pi] {
                *content = trim_sources_only(content);
            }
        }
    }
    messages
}

fn is_web_search_result(content: &str) -> bool {
    serde_json::from_str::<Value>(content)
        .ok()
        .map(|v| v.get("sources").is_some())
        .unwrap_or(false)
}

fn trim_sources_only(content: &str) -> String {
    match serde_json::from_str::<Value>(content) {
        Ok(v) => {
            let sources = v.get("sources").cloned().unwrap_or(Value::Array(Vec::new()));
            serde_json::json!({"sources": sources, "truncated": true}).to_string()
        }
        Err(_) => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_domain::error::tool_error;

    fn cfg() -> CompactionConfig {
        CompactionConfig::default()
    }

    /// `extract_all_text` only surfaces `Text` parts; tool results live in
    /// a separate variant, so tests pull their content out directly.
    fn tool_result_text(msg: &Message) -> String {
        match &msg.content {
            MessageContent::Parts(parts) => parts
                .iter()
                .find_map(|p| match p {
                    ContentPart::ToolResult { content, .. } => Some(content.clone()),
                    _ => None,
                })
                .unwrap_or_default(),
            MessageContent::Text(t) => t.clone(),
        }
    }

    #[test]
    fn trim_old_tool_results_collapses_older_but_keeps_recent() {
        let mut messages = Vec::new();
        for i in 0..8 {
            messages.push(Message::tool_result(format!("call{i}"), serde_json::json!({"ok": true}).to_string()));
        }
        let trimmed = trim_old_tool_results(messages, 3);
        let contents: Vec<String> = trimmed.iter().map(tool_result_text).collect();
        assert_eq!(contents[0], "[ok]");
        assert!(!contents[7].contains("[ok]"));
    }

    #[test]
    fn trim_old_tool_results_preserves_correlation_ids() {
        let messages = vec![Message::tool_result("call-abc", "{}")];
        let trimmed = trim_old_tool_results(messages, 0);
        if let MessageContent::Parts(parts) = &trimmed[0].content {
            if let ContentPart::ToolResult { tool_use_id, .. } = &parts[0] {
                assert_eq!(tool_use_id, "call-abc");
                return;
            }
        }
        panic!("expected a tool result part");
    }

    #[test]
    fn error_results_collapse_to_error_code_placeholder() {
        let err = tool_error("CLAIM_LIMIT_EXCEEDED", "too many claims");
        let mut messages = vec![Message {
            role: forge_domain::tool::Role::Tool,
            content: MessageContent::Parts(vec![ContentPart::ToolResult {
                tool_use_id: "c1".into(),
                content: err.to_string(),
                is_error: true,
            }]),
        }];
        messages = trim_old_tool_results(messages, 0);
        assert_eq!(tool_result_text(&messages[0]), "[error:CLAIM_LIMIT_EXCEEDED]");
    }

    #[test]
    fn compact_middle_preserves_first_user_and_recent_tail() {
        let mut messages = vec![Message::user("original problem statement")];
        for i in 0..30 {
            messages.push(Message::assistant(format!("turn {i}")));
        }
        let compacted = compact_middle(messages.clone(), 20, 8);
        assert!(compacted.len() < messages.len());
        assert_eq!(compacted[0].content.extract_all_text(), "original problem statement");
        assert!(compacted[1].content.extract_all_text().contains(COMPACTION_MARKER));
        assert_eq!(compacted.last().unwrap().content.extract_all_text(), "turn 29");
    }

    #[test]
    fn compact_middle_is_idempotent() {
        let mut messages = vec![Message::user("problem")];
        for i in 0..30 {
            messages.push(Message::assistant(format!("turn {i}")));
        }
        let once = compact_middle(messages, 20, 8);
        let twice = compact_middle(once.clone(), 20, 8);
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn below_threshold_is_untouched() {
        let messages = vec![Message::user("a"), Message::assistant("b")];
        let compacted = compact_middle(messages.clone(), 20, 8);
        assert_eq!(compacted.len(), messages.len());
    }

    #[test]
    fn trim_old_web_search_results_drops_summary_but_keeps_sources() {
        let mut messages = Vec::new();
        for i in 0..6 {
            let content = serde_json::json!({"summary": format!("findings {i}"), "sources": ["https://a.com"]}).to_string();
            messages.push(Message::tool_result(format!("call{i}"), content));
        }
        let trimmed = trim_old_web_search_results(messages, 2);
        let first: Value = serde_json::from_str(&tool_result_text(&trimmed[0])).unwrap();
        assert!(first.get("summary").is_none());
        assert!(first.get("sources").is_some());
        let last: Value = serde_json::from_str(&tool_result_text(&trimmed[5])).unwrap();
        assert!(last.get("summary").is_some());
    }

    #[test]
    fn optimize_context_runs_all_three_stages_without_panicking() {
        let mut messages = vec![Message::user("problem")];
        for i in 0..25 {
            messages.push(Message::assistant(format!("turn {i}")));
            messages.push(Message::tool_result(format!("c{i}"), serde_json::json!({"sources": []}).to_string()));
        }
        let optimized = optimize_context(&messages, &cfg());
        assert!(!optimized.is_empty());
    }
}
