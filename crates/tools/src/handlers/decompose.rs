//! DECOMPOSE-phase tool handlers.

use forge_domain::error::tool_error;
use forge_domain::state::forge_state::{Assumption, ForgeState};
use forge_domain::state::claim::ProblemReframing;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ok, parse_args};

pub struct DecomposeHandlers;

#[derive(Deserialize)]
struct DecomposeToFundamentalsArgs {
    fundamentals: Vec<String>,
    #[allow(dead_code)]
    approach: String,
}

#[derive(Deserialize)]
struct MapStateOfArtArgs {
    domain: String,
    key_findings: Vec<String>,
}

#[derive(Deserialize)]
struct ExtractedAssumption {
    text: String,
    source: String,
    options: Vec<String>,
}

#[derive(Deserialize)]
struct ExtractAssumptionsArgs {
    assumptions: Vec<ExtractedAssumption>,
}

#[derive(Deserialize)]
struct ReframeProblemArgs {
    text: String,
    #[serde(rename = "type")]
    reframing_type: String,
    reasoning: String,
    #[allow(dead_code)]
    resonance_prompt: String,
    resonance_options: Vec<String>,
}

impl DecomposeHandlers {
    /// Overwrites `state.fundamentals` with the model's decomposition.
    pub fn decompose_to_fundamentals(state: &mut ForgeState, args: Value) -> Value {
        let req: DecomposeToFundamentalsArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if req.fundamentals.is_empty() {
            return tool_error("DECOMPOSE_INCOMPLETE", "fundamentals must not be empty");
        }
        state.fundamentals = req.fundamentals;
        ok(json!({"count": state.fundamentals.len()}))
    }

    /// Precondition: `has_web_search_this_phase`. Sets `state_of_art_researched`.
    pub fn map_state_of_art(state: &mut ForgeState, args: Value) -> Value {
        if !state.has_web_search_this_phase() {
            return tool_error(
                "STATE_OF_ART_NOT_RESEARCHED",
                "research this phase is required before map_state_of_art",
            );
        }
        let req: MapStateOfArtArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if req.key_findings.is_empty() {
            return tool_error("DECOMPOSE_INCOMPLETE", "key_findings must not be empty");
        }
        state.state_of_art_researched = true;
        ok(json!({"domain": req.domain, "findings_recorded": req.key_findings.len()}))
    }

    /// Appends each extracted assumption with its source and response
    /// options. Each option list must offer 2-4 choices, per the schema.
    pub fn extract_assumptions(state: &mut ForgeState, args: Value) -> Value {
        let req: ExtractAssumptionsArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if req.assumptions.is_empty() {
            return tool_error("DECOMPOSE_INCOMPLETE", "assumptions must not be empty");
        }
        for assumption in &req.assumptions {
            if assumption.options.len() < 2 || assumption.options.len() > 4 {
                return tool_error("DECOMPOSE_INCOMPLETE", "each assumption's options must offer 2 to 4 choices");
            }
        }
        for assumption in req.assumptions {
            Self::record_assumption(state, assumption.text, assumption.source, assumption.options);
        }
        ok(json!({"assumption_count": state.assumptions.len()}))
    }

    /// Appends a reframing proposal. The reframing becomes durable the
    /// moment the session's `ForgeState` snapshot is next committed, since
    /// the field lives on the state itself.
    pub fn reframe_problem(state: &mut ForgeState, args: Value) -> Value {
        let req: ReframeProblemArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if req.resonance_options.len() < 3 || req.resonance_options.len() > 4 {
            return tool_error("DECOMPOSE_INCOMPLETE", "resonance_options must offer 3 or 4 choices");
        }
        state.reframings.push(ProblemReframing {
            text: req.text,
            reframing_type: req.reframing_type,
            reasoning: req.reasoning,
            resonance_options: req.resonance_options,
            selected: None,
        });
        ok(json!({"reframing_count": state.reframings.len()}))
    }

    /// Appends one extracted assumption, with the options the user can pick
    /// among to resolve it.
    fn record_assumption(state: &mut ForgeState, text: String, source: String, options: Vec<String>) {
        state.assumptions.push(Assumption {
            text,
            source,
            options,
            selected_option: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompose_to_fundamentals_overwrites_state() {
        let mut state = ForgeState::default();
        let result = DecomposeHandlers::decompose_to_fundamentals(
            &mut state,
            json!({"fundamentals": ["f1", "f2"], "approach": "first principles"}),
        );
        assert_eq!(result["status"], "ok");
        assert_eq!(state.fundamentals, vec!["f1", "f2"]);
    }

    #[test]
    fn map_state_of_art_requires_research_first() {
        let mut state = ForgeState::default();
        let result = DecomposeHandlers::map_state_of_art(
            &mut state,
            json!({"domain": "d", "key_findings": ["x"]}),
        );
        assert_eq!(result["error_code"], "STATE_OF_ART_NOT_RESEARCHED");
        assert!(!state.state_of_art_researched);
    }

    #[test]
    fn map_state_of_art_succeeds_after_research() {
        let mut state = ForgeState::default();
        state.record_web_search("q", "s");
        let result = DecomposeHandlers::map_state_of_art(
            &mut state,
            json!({"domain": "d", "key_findings": ["x"]}),
        );
        assert_eq!(result["status"], "ok");
        assert!(state.state_of_art_researched);
    }

    #[test]
    fn extract_assumptions_appends_each_with_options() {
        let mut state = ForgeState::default();
        let result = DecomposeHandlers::extract_assumptions(
            &mut state,
            json!({
                "assumptions": [
                    {"text": "a1", "source": "problem statement", "options": ["confirm", "challenge"]},
                    {"text": "a2", "source": "industry norm", "options": ["confirm", "nuance", "challenge"]},
                ],
            }),
        );
        assert_eq!(result["status"], "ok");
        assert_eq!(state.assumptions.len(), 2);
        assert_eq!(state.assumptions[0].text, "a1");
        assert_eq!(state.assumptions[1].options, vec!["confirm", "nuance", "challenge"]);
    }

    #[test]
    fn extract_assumptions_rejects_option_count_out_of_range() {
        let mut state = ForgeState::default();
        let result = DecomposeHandlers::extract_assumptions(
            &mut state,
            json!({"assumptions": [{"text": "a1", "source": "s", "options": ["only_one"]}]}),
        );
        assert_eq!(result["error_code"], "DECOMPOSE_INCOMPLETE");
        assert!(state.assumptions.is_empty());
    }

    #[test]
    fn reframe_problem_rejects_too_few_options() {
        let mut state = ForgeState::default();
        let result = DecomposeHandlers::reframe_problem(
            &mut state,
            json!({
                "text": "t",
                "type": "inversion",
                "reasoning": "r",
                "resonance_prompt": "p",
                "resonance_options": ["a", "b"],
            }),
        );
        assert_eq!(result["error_code"], "DECOMPOSE_INCOMPLETE");
    }
}
