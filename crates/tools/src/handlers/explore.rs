//! EXPLORE-phase tool handlers.

use forge_domain::error::tool_error;
use forge_domain::state::claim::{Contradiction, CrossDomainAnalogy};
use forge_domain::state::forge_state::{ForgeState, MorphologicalBox, MorphologicalParameter};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ok, parse_args};

pub struct ExploreHandlers;

#[derive(Deserialize)]
struct ParameterArg {
    name: String,
    values: Vec<String>,
}

#[derive(Deserialize)]
struct BuildMorphologicalBoxArgs {
    parameters: Vec<ParameterArg>,
}

#[derive(Deserialize)]
struct SearchCrossDomainArgs {
    source_domain: String,
    #[allow(dead_code)]
    target_application: String,
    analogy_description: String,
    semantic_distance: f64,
    #[allow(dead_code)]
    key_findings: Vec<String>,
    resonance_prompt: String,
    resonance_options: Vec<String>,
}

#[derive(Deserialize)]
struct IdentifyContradictionsArgs {
    property_a: String,
    property_b: String,
    description: String,
}

impl ExploreHandlers {
    /// Validates at least 3 parameters, each with at least 3 values.
    pub fn build_morphological_box(state: &mut ForgeState, args: Value) -> Value {
        let req: BuildMorphologicalBoxArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if req.parameters.len() < 3 {
            return tool_error("DECOMPOSE_INCOMPLETE", "at least 3 parameters are required");
        }
        if req.parameters.iter().any(|p| p.values.len() < 3) {
            return tool_error("DECOMPOSE_INCOMPLETE", "every parameter needs at least 3 values");
        }
        let parameter_count = req.parameters.len();
        state.morphological_box = Some(MorphologicalBox {
            parameters: req
                .parameters
                .into_iter()
                .map(|p| MorphologicalParameter { name: p.name, values: p.values })
                .collect(),
        });
        ok(json!({"parameter_count": parameter_count}))
    }

    /// Precondition: `has_web_search_this_phase`. Increments
    /// `cross_domain_search_count`. The caller decides resonance by a
    /// follow-up `resonance_prompt` reply; here the analogy is recorded as
    /// not-yet-resonated.
    pub fn search_cross_domain(state: &mut ForgeState, args: Value) -> Value {
        if !state.has_web_search_this_phase() {
            return tool_error("CROSS_DOMAIN_NOT_SEARCHED", "research this phase is required before search_cross_domain");
        }
        let req: SearchCrossDomainArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        state.cross_domain_search_count += 1;
        state.cross_domain_analogies.push(CrossDomainAnalogy {
            domain: req.source_domain,
            description: req.analogy_description,
            semantic_distance: req.semantic_distance,
            resonance_options: req.resonance_options,
            resonated: false,
        });
        ok(json!({
            "cross_domain_search_count": state.cross_domain_search_count,
            "resonance_prompt": req.resonance_prompt,
        }))
    }

    pub fn identify_contradictions(state: &mut ForgeState, args: Value) -> Value {
        let req: IdentifyContradictionsArgs = match parse_args(args) {
            Ok(r) => r,
            Err(e) => return e,
        };
        state.contradictions.push(Contradiction {
            property_a: req.property_a,
            property_b: req.property_b,
            description: req.description,
        });
        ok(json!({"contradiction_count": state.contradictions.len()}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_params() -> Value {
        json!({
            "parameters": [
                {"name": "p1", "values": ["a", "b", "c"]},
                {"name": "p2", "values": ["a", "b", "c"]},
                {"name": "p3", "values": ["a", "b", "c"]},
            ]
        })
    }

    #[test]
    fn build_morphological_box_requires_three_parameters() {
        let mut state = ForgeState::default();
        let result = ExploreHandlers::build_morphological_box(
            &mut state,
            json!({"parameters": [{"name": "p1", "values": ["a", "b", "c"]}]}),
        );
        assert_eq!(result["error_code"], "DECOMPOSE_INCOMPLETE");
    }

    #[test]
    fn build_morphological_box_accepts_valid_shape() {
        let mut state = ForgeState::default();
        let result = ExploreHandlers::build_morphological_box(&mut state, three_params());
        assert_eq!(result["status"], "ok");
        assert!(state.morphological_box.is_some());
    }

    #[test]
    fn search_cross_domain_requires_research_first() {
        let mut state = ForgeState::default();
        let result = ExploreHandlers::search_cross_domain(
            &mut state,
            json!({
                "source_domain": "biology",
                "target_application": "networking",
                "analogy_description": "d",
                "semantic_distance": 0.7,
                "key_findings": [],
                "resonance_prompt": "p",
                "resonance_options": [],
            }),
        );
        assert_eq!(result["error_code"], "CROSS_DOMAIN_NOT_SEARCHED");
    }

    #[test]
    fn search_cross_domain_increments_count_after_research() {
        let mut state = ForgeState::default();
        state.record_web_search("q", "s");
        ExploreHandlers::search_cross_domain(
            &mut state,
            json!({
                "source_domain": "biology",
                "target_application": "networking",
                "analogy_description": "d",
                "semantic_distance": 0.7,
                "key_findings": [],
                "resonance_prompt": "p",
                "resonance_options": [],
            }),
        );
        assert_eq!(state.cross_domain_search_count, 1);
    }
}
