//! The agent runner — the inner loop that streams LLM output, dispatches
//! tool calls, advances phases, and persists state after every step.
//!
//! Entry point: [`run_turn`] spawns the loop on a background task and
//! returns a channel of [`TurnEvent`]s the caller streams out over SSE (or
//! drains to build a single non-streaming response).

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use forge_domain::error::{Error, Result};
use forge_domain::phase::Phase;
use forge_domain::state::enforce;
use forge_domain::state::forge_state::ForgeState;
use forge_domain::stream::{StreamEvent, Usage};
use forge_domain::tool::{ContentPart, Message, MessageContent, Role, ToolCall};

use forge_providers::ChatRequest;
use forge_tools::dispatch::advance_build_round;
use forge_tools::{all_tools_for_phase, dispatch};

use crate::state::AppState;

use super::cancel::CancelToken;
use super::compact::optimize_context;
use super::prompt::build_system_prompt;

/// Tool-call loops per turn before the runner force-stops and reports an
/// error rather than spinning forever on a model that won't converge.
const MAX_ITERATIONS: usize = 50;

#[derive(Debug, Clone)]
pub struct TurnInput {
    pub session_id: String,
    pub user_message: String,
}

/// Events streamed out of a turn. A superset of the provider-level
/// [`StreamEvent`] with session-lifecycle events layered on top.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum TurnEvent {
    #[serde(rename = "token")]
    Token { text: String },
    #[serde(rename = "tool_call")]
    ToolCall { call_id: String, tool_name: String, arguments: Value },
    #[serde(rename = "tool_result")]
    ToolResult { call_id: String, result: Value },
    #[serde(rename = "phase_advanced")]
    PhaseAdvanced { from: String, to: String, round: usize },
    /// A phase's review payload, built at a `round_review`/`final_spec_review`
    /// pause — see `runtime::review::build_review_event`. `event_type` is one
    /// of `review_decompose`, `review_explore`, `review_claims`,
    /// `review_build`, or `knowledge_document`, and becomes the SSE event
    /// name in place of this variant's own tag.
    #[serde(rename = "review")]
    Review { event_type: String, data: Value },
    #[serde(rename = "paused")]
    Paused { input_type: String },
    #[serde(rename = "done")]
    Done { usage: TurnUsage },
    #[serde(rename = "cancelled")]
    Cancelled,
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Run one turn: resolve the session lock, stream the model, dispatch
/// tools, persist after every step. Returns a receiver the caller polls
/// for [`TurnEvent`]s; the sender side is dropped (closing the channel)
/// once the turn ends, is cancelled, or hits [`MAX_ITERATIONS`].
pub async fn run_turn(state: Arc<AppState>, input: TurnInput) -> Result<mpsc::Receiver<TurnEvent>> {
    let (tx, rx) = mpsc::channel(64);
    let session_id = input.session_id.clone();

    let permit = state
        .session_locks
        .acquire(&session_id)
        .await
        .map_err(|_| Error::Conflict(format!("session {session_id} is busy")))?;
    let cancel_token = state.cancel_map.register(&session_id);

    tokio::spawn(async move {
        let _permit = permit;
        let result = run_turn_inner(&state, &input, &cancel_token, &tx).await;
        if let Err(e) = result {
            let _ = tx
                .send(TurnEvent::Error { code: e.code().to_string(), message: e.to_string() })
                .await;
        }
        state.cancel_map.remove(&session_id);
    });

    Ok(rx)
}

async fn run_turn_inner(
    state: &AppState,
    input: &TurnInput,
    cancel: &CancelToken,
    tx: &mpsc::Sender<TurnEvent>,
) -> Result<()> {
    let mut forge_state = state.ensure_live_state(&input.session_id)?;
    let mut history = state
        .sessions
        .get(&input.session_id)
        .map(|row| row.message_history)
        .unwrap_or_default();

    history.push(Message::user(input.user_message.clone()));
    state.sessions.append_messages(&input.session_id, std::slice::from_ref(&history.last().unwrap().clone()))?;

    let research_agent = state.research_agent();
    let mut total_usage = TurnUsage::default();

    for _ in 0..MAX_ITERATIONS {
        if cancel.is_cancelled() || forge_state.cancelled {
            tx.send(TurnEvent::Cancelled).await.ok();
            return Ok(());
        }

        let compacted = optimize_context(&history, &state.config.compaction);
        let system_prompt = build_system_prompt(&forge_state);

        let mut messages = vec![Message::system(system_prompt)];
        messages.extend(compacted);

        let tools = all_tools_for_phase(forge_state.current_phase);
        let (provider, model) = state
            .providers
            .for_role("primary")
            .map(|p| (p, state.providers.model_for_role("primary").map(str::to_string)))
            .or_else(|| state.providers.iter().next().map(|(_, p)| (p.clone(), None)))
            .ok_or_else(|| Error::Config("no LLM providers configured".to_string()))?;

        let req = ChatRequest {
            messages,
            tools,
            model,
            ..Default::default()
        };

        let mut stream = provider.chat_stream(req).await?;
        let mut text = String::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        let mut usage: Option<Usage> = None;

        use futures_util::StreamExt;
        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::Token { text: chunk } => {
                    text.push_str(&chunk);
                    tx.send(TurnEvent::Token { text: chunk }).await.ok();
                }
                StreamEvent::ToolCallFinished { call_id, tool_name, arguments } => {
                    tx.send(TurnEvent::ToolCall {
                        call_id: call_id.clone(),
                        tool_name: tool_name.clone(),
                        arguments: arguments.clone(),
                    })
                    .await
                    .ok();
                    tool_calls.push(ToolCall { call_id, tool_name, arguments });
                }
                StreamEvent::Done { usage: u, .. } => usage = u,
                StreamEvent::Error { message } => return Err(Error::Provider {
                    provider: "llm".to_string(),
                    message,
                }),
                _ => {}
            }
        }

        if let Some(u) = &usage {
            total_usage.input_tokens += u.prompt_tokens as u64;
            total_usage.output_tokens += u.completion_tokens as u64;
            state.sessions.record_usage(&input.session_id, u)?;
        }

        if let Some(mismatch) = super::language::check_response_language(&text, forge_state.locale) {
            tracing::warn!(
                session_id = %input.session_id,
                locale = %forge_state.locale,
                message = %mismatch["message"],
                "response language mismatch (best-effort, not enforced)"
            );
        }

        let assistant_msg = build_assistant_tool_message(&text, &tool_calls);
        history.push(assistant_msg.clone());
        state.sessions.append_messages(&input.session_id, std::slice::from_ref(&assistant_msg))?;

        let had_tool_calls = !tool_calls.is_empty();

        for call in &tool_calls {
            let result = dispatch(
                &call.tool_name,
                call.arguments.clone(),
                &mut forge_state,
                &state.claims,
                &input.session_id,
                research_agent.as_ref(),
            )
            .await;

            let is_error = result["status"] == "error";
            let tool_result_msg = Message {
                role: Role::Tool,
                content: MessageContent::Parts(vec![ContentPart::ToolResult {
                    tool_use_id: call.call_id.clone(),
                    content: result.to_string(),
                    is_error,
                }]),
            };
            history.push(tool_result_msg.clone());
            state.sessions.append_messages(&input.session_id, std::slice::from_ref(&tool_result_msg))?;

            tx.send(TurnEvent::ToolResult { call_id: call.call_id.clone(), result: result.clone() }).await.ok();
        }

        if forge_state.awaiting_user_input {
            let input_type = forge_state.awaiting_input_type.clone().unwrap_or_else(|| "unspecified".to_string());
            if matches!(input_type.as_str(), "round_review" | "final_spec_review") {
                if let Some((event_type, data)) = super::review::build_review_event(&forge_state) {
                    let translated =
                        super::translate::translate_review_event(state.translator.as_ref(), event_type, data, forge_state.locale)
                            .await;
                    tx.send(TurnEvent::Review { event_type: event_type.to_string(), data: translated }).await.ok();
                }
            }
            state.sessions.commit_snapshot(&input.session_id, &forge_state)?;
            state.set_live_state(&input.session_id, forge_state);
            tx.send(TurnEvent::Paused { input_type }).await.ok();
            return Ok(());
        }

        // Working-document gate: if the model stopped calling tools but
        // hasn't recorded this phase's progress yet, nudge it back in
        // rather than ending the turn on an incomplete phase.
        if !had_tool_calls
            && forge_state.current_phase.requires_document_gate()
            && !forge_state.document_updated_this_phase
        {
            let nudge = Message::user(
                "Call update_working_document to record this phase's progress before moving on."
                    .to_string(),
            );
            history.push(nudge.clone());
            state.sessions.append_messages(&input.session_id, std::slice::from_ref(&nudge))?;
            state.set_live_state(&input.session_id, forge_state.clone());
            continue;
        }

        // BUILD contributes no tool of its own (see `schemas::build_tools`);
        // once the model stops calling tools this round, the runner decides
        // directly whether to loop back to SYNTHESIZE or fall through to
        // CRYSTALLIZE on MAX_ROUNDS_EXCEEDED.
        if !had_tool_calls && forge_state.current_phase == Phase::Build {
            let from = Phase::Build;
            let result = advance_build_round(&mut forge_state);
            if result["status"] == "error" {
                if result["error_code"] == "MAX_ROUNDS_EXCEEDED" {
                    forge_state.transition_to(Phase::Crystallize);
                    state.sessions.commit_snapshot(&input.session_id, &forge_state)?;
                    tx.send(TurnEvent::PhaseAdvanced {
                        from: from.as_str().to_string(),
                        to: Phase::Crystallize.as_str().to_string(),
                        round: forge_state.current_round,
                    })
                    .await
                    .ok();
                } else {
                    let code = result["error_code"].as_str().unwrap_or("UNKNOWN");
                    let message = result["message"].as_str().unwrap_or("round is not ready to close");
                    let nudge = Message::user(format!("{message} ({code})"));
                    history.push(nudge.clone());
                    state.sessions.append_messages(&input.session_id, std::slice::from_ref(&nudge))?;
                }
            } else {
                state.sessions.commit_snapshot(&input.session_id, &forge_state)?;
                tx.send(TurnEvent::PhaseAdvanced {
                    from: from.as_str().to_string(),
                    to: Phase::Synthesize.as_str().to_string(),
                    round: forge_state.current_round,
                })
                .await
                .ok();
            }
            state.set_live_state(&input.session_id, forge_state.clone());
            continue;
        }

        if let Some((from, to)) = maybe_advance_phase(&mut forge_state) {
            state.sessions.commit_snapshot(&input.session_id, &forge_state)?;
            tx.send(TurnEvent::PhaseAdvanced {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
                round: forge_state.current_round,
            })
            .await
            .ok();
        }

        if !had_tool_calls {
            state.sessions.commit_snapshot(&input.session_id, &forge_state)?;
            state.set_live_state(&input.session_id, forge_state);
            tx.send(TurnEvent::Done { usage: total_usage }).await.ok();
            return Ok(());
        }

        state.set_live_state(&input.session_id, forge_state.clone());
    }

    state.sessions.commit_snapshot(&input.session_id, &forge_state)?;
    state.set_live_state(&input.session_id, forge_state);
    Err(Error::Other(format!("turn exceeded {MAX_ITERATIONS} tool-call iterations without converging")))
}

/// Check whether the current phase's forward gate now passes and, if so,
/// transition. BUILD is handled directly in the turn loop (it owns the
/// BUILD → SYNTHESIZE/CRYSTALLIZE decision, including the max-rounds
/// fallback), so it's skipped here.
fn maybe_advance_phase(state: &mut ForgeState) -> Option<(Phase, Phase)> {
    let ready = match state.current_phase {
        Phase::Decompose => enforce::decompose_to_explore(state).is_none(),
        Phase::Explore => enforce::explore_to_synthesize(state).is_none(),
        Phase::Synthesize => enforce::synthesize_to_validate(state).is_none(),
        Phase::Validate => validate_round_complete(state),
        Phase::Build | Phase::Crystallize => return None,
    };
    if !ready || enforce::working_document_gate(state).is_some() {
        return None;
    }
    let from = state.current_phase;
    let to = from.next()?;
    state.transition_to(to);
    Some((from, to))
}

/// VALIDATE → BUILD has no dedicated enforcement predicate in the domain
/// crate ("remaining transitions delegated to handler logic"): every claim
/// raised this round must be falsified, novelty-checked, and scored into
/// the graph before the round can close.
fn validate_round_complete(state: &ForgeState) -> bool {
    !state.current_round_claims.is_empty()
        && state.all_claims_falsified()
        && state.all_claims_novelty_checked()
        && state.current_round_claims.iter().all(|c| c.verdict.is_some())
}

fn build_assistant_tool_message(text: &str, tool_calls: &[ToolCall]) -> Message {
    let mut parts = Vec::new();
    if !text.is_empty() {
        parts.push(ContentPart::Text { text: text.to_string() });
    }
    for call in tool_calls {
        parts.push(ContentPart::ToolUse {
            id: call.call_id.clone(),
            name: call.tool_name.clone(),
            input: call.arguments.clone(),
        });
    }
    Message { role: Role::Assistant, content: MessageContent::Parts(parts) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_assistant_tool_message_includes_text_and_tool_uses() {
        let calls = vec![ToolCall {
            call_id: "c1".into(),
            tool_name: "decompose_to_fundamentals".into(),
            arguments: serde_json::json!({}),
        }];
        let msg = build_assistant_tool_message("thinking", &calls);
        match &msg.content {
            MessageContent::Parts(parts) => assert_eq!(parts.len(), 2),
            _ => panic!("expected parts"),
        }
    }

    #[test]
    fn maybe_advance_phase_noop_without_working_document_update() {
        let mut state = ForgeState::default();
        state.fundamentals.push("f".into());
        state.state_of_art_researched = true;
        state.assumptions = (0..3)
            .map(|i| forge_domain::state::forge_state::Assumption {
                text: format!("a{i}"),
                source: "s".into(),
                options: vec!["x".into()],
                selected_option: Some(0),
            })
            .collect();
        state.reframings = (0..3)
            .map(|i| forge_domain::state::claim::ProblemReframing {
                text: format!("r{i}"),
                reframing_type: "reframe".into(),
                reasoning: "because".into(),
                resonance_options: vec!["a".into()],
                selected: if i == 0 { Some(0) } else { None },
            })
            .collect();
        // document_updated_this_phase is false by default — gate should block.
        assert!(maybe_advance_phase(&mut state).is_none());
        assert_eq!(state.current_phase, Phase::Decompose);
    }

    #[test]
    fn maybe_advance_phase_transitions_when_gates_pass() {
        let mut state = ForgeState::default();
        state.fundamentals.push("f".into());
        state.state_of_art_researched = true;
        state.assumptions = (0..3)
            .map(|i| forge_domain::state::forge_state::Assumption {
                text: format!("a{i}"),
                source: "s".into(),
                options: vec!["x".into()],
                selected_option: Some(0),
            })
            .collect();
        state.reframings = (0..3)
            .map(|i| forge_domain::state::claim::ProblemReframing {
                text: format!("r{i}"),
                reframing_type: "reframe".into(),
                reasoning: "because".into(),
                resonance_options: vec!["a".into()],
                selected: if i == 0 { Some(0) } else { None },
            })
            .collect();
        state.document_updated_this_phase = true;
        let advanced = maybe_advance_phase(&mut state);
        assert_eq!(advanced, Some((Phase::Decompose, Phase::Explore)));
        assert_eq!(state.current_phase, Phase::Explore);
    }

    #[test]
    fn validate_blocks_until_every_claim_is_scored() {
        let mut state = ForgeState::default();
        state.current_phase = Phase::Validate;
        state.document_updated_this_phase = true;
        state.current_round_claims.push(forge_domain::state::claim::RoundClaim {
            claim_id: "c0".into(),
            claim_text: "claim".into(),
            thesis_text: "thesis".into(),
            antithesis_text: "antithesis".into(),
            falsifiability_condition: "cond".into(),
            confidence: 0.5,
            evidence: vec![],
            builds_on_claim_id: None,
            resonance_options: vec![],
            verdict: None,
            qualification: None,
            scores: None,
        });
        // Not yet falsified/novelty-checked/scored — gate blocks.
        assert!(maybe_advance_phase(&mut state).is_none());
        assert_eq!(state.current_phase, Phase::Validate);

        state.falsification_attempted.insert(0);
        state.novelty_checked.insert(0);
        state.current_round_claims[0].verdict = Some(forge_domain::state::claim::Verdict::Accept);
        let advanced = maybe_advance_phase(&mut state);
        assert_eq!(advanced, Some((Phase::Validate, Phase::Build)));
        assert_eq!(state.current_phase, Phase::Build);
    }
}
