//! Pause tools: end the turn and hand control back to the user.
//!
//! Each sets `awaiting_user_input` plus an `awaiting_input_type` tag the
//! runner checks after dispatch to decide whether to stop the turn and
//! commit the snapshot before closing the stream.

use forge_domain::state::forge_state::ForgeState;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ok, parse_args};

pub struct InteractionHandlers;

#[derive(Deserialize)]
struct AskUserArgs {
    question: String,
    #[serde(default)]
    context: Option<String>,
}

#[derive(Deserialize)]
struct PresentRoundArgs {
    summary: String,
}

impl InteractionHandlers {
    pub fn ask_user(state: &mut ForgeState, args: Value) -> Value {
        let req: AskUserArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        state.awaiting_user_input = true;
        state.awaiting_input_type = Some("question".to_string());
        ok(json!({"question": req.question, "context": req.context}))
    }

    pub fn present_round(state: &mut ForgeState, args: Value) -> Value {
        let req: PresentRoundArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        state.awaiting_user_input = true;
        state.awaiting_input_type = Some("round_review".to_string());
        ok(json!({"summary": req.summary}))
    }

    pub fn generate_final_spec(state: &mut ForgeState, _args: Value) -> Value {
        state.awaiting_user_input = true;
        state.awaiting_input_type = Some("final_spec_review".to_string());
        ok(json!({"ready": state.knowledge_document_markdown.is_some()}))
    }
}
