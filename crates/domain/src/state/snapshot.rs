use serde_json::Value;

use crate::state::forge_state::ForgeState;

/// Serialize a ForgeState to its snapshot form: a JSON object of
/// primitives, transients excluded, sets rendered as sorted lists (via
/// `BTreeSet`'s natural serialization order).
pub fn to_snapshot(state: &ForgeState) -> Value {
    serde_json::to_value(state).expect("ForgeState serialization is infallible")
}

/// Restore a ForgeState from a snapshot. Missing keys fall back to the
/// default ForgeState's value for that key, so old snapshots stay valid
/// across additive schema changes. `from_snapshot(Value::Object(empty))`
/// is exactly `ForgeState::default()`.
pub fn from_snapshot(snapshot: Value) -> crate::error::Result<ForgeState> {
    let mut base = to_snapshot(&ForgeState::default());
    merge_onto(&mut base, snapshot);
    serde_json::from_value(base).map_err(crate::error::Error::Json)
}

/// Merge `incoming` onto `base` one key at a time (shallow per top-level
/// field — nested objects are replaced wholesale, not deep-merged, since
/// every ForgeState field is itself a complete unit of state).
fn merge_onto(base: &mut Value, incoming: Value) {
    let (Value::Object(base_map), Value::Object(incoming_map)) = (base, incoming) else {
        return;
    };
    for (key, value) in incoming_map {
        base_map.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;

    #[test]
    fn empty_snapshot_restores_defaults() {
        let restored = from_snapshot(Value::Object(Default::default())).unwrap();
        let default = ForgeState::default();
        assert_eq!(restored.current_phase, default.current_phase);
        assert_eq!(restored.fundamentals, default.fundamentals);
    }

    #[test]
    fn round_trip_preserves_populated_fields() {
        let mut state = ForgeState::default();
        state.current_phase = Phase::Synthesize;
        state.current_round = 2;
        state.fundamentals = vec!["a".into(), "b".into()];
        state.antitheses_searched.insert(1);
        state.antitheses_searched.insert(0);

        let snapshot = to_snapshot(&state);
        let restored = from_snapshot(snapshot).unwrap();

        assert_eq!(restored.current_phase, Phase::Synthesize);
        assert_eq!(restored.current_round, 2);
        assert_eq!(restored.fundamentals, vec!["a", "b"]);
        assert_eq!(
            restored.antitheses_searched.into_iter().collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[test]
    fn partial_snapshot_fills_gaps_with_defaults() {
        let snapshot = serde_json::json!({ "current_round": 3 });
        let restored = from_snapshot(snapshot).unwrap();
        assert_eq!(restored.current_round, 3);
        assert_eq!(restored.current_phase, Phase::Decompose);
    }

    #[test]
    fn transient_cancelled_flag_is_excluded() {
        let mut state = ForgeState::default();
        state.cancelled = true;
        let snapshot = to_snapshot(&state);
        assert!(snapshot.get("cancelled").is_none());
    }
}
