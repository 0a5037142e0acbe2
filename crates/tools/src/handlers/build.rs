//! BUILD-phase handler.
//!
//! BUILD contributes no tool schema of its own (see
//! [`crate::schemas::build_tools`]); its only job is deciding, at the end
//! of the phase, whether the session loops back into another SYNTHESIZE
//! round or proceeds to CRYSTALLIZE.

use forge_domain::phase::Phase;
use forge_domain::state::enforce::build_to_synthesize;
use forge_domain::state::forge_state::ForgeState;
use serde_json::json;

use super::ok;

pub struct BuildHandlers;

impl BuildHandlers {
    /// Applies the BUILD → SYNTHESIZE gate (§4.3). On pass, advances the
    /// round and transitions back to SYNTHESIZE; on failure, returns the
    /// gate's error envelope unchanged and leaves state untouched.
    pub fn advance_round(state: &mut ForgeState) -> serde_json::Value {
        if let Some(err) = build_to_synthesize(state) {
            return err;
        }
        state.reset_for_new_round();
        state.transition_to(Phase::Synthesize);
        ok(json!({"round": state.current_round}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_round_blocked_without_negative_knowledge_consult() {
        let mut state = ForgeState::default();
        state.current_round = 1;
        state.previous_claims_referenced = true;
        let result = BuildHandlers::advance_round(&mut state);
        assert_eq!(result["error_code"], "NEGATIVE_KNOWLEDGE_MISSING");
        assert_eq!(state.current_round, 1);
    }

    #[test]
    fn advance_round_succeeds_and_loops_back_to_synthesize() {
        let mut state = ForgeState::default();
        state.current_round = 1;
        state.previous_claims_referenced = true;
        state.negative_knowledge_consulted = true;
        let result = BuildHandlers::advance_round(&mut state);
        assert_eq!(result["status"], "ok");
        assert_eq!(state.current_round, 2);
        assert_eq!(state.current_phase, Phase::Synthesize);
    }
}
