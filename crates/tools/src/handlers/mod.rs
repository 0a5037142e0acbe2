//! Tool handlers: one `*Handlers` struct per teacher `handle_*` module.
//!
//! Every handler follows the same discipline: pure precondition check →
//! domain mutation on `ForgeState` → persistence side-effect (when the
//! contract calls for a durable row) → return a tool-result-shaped
//! [`serde_json::Value`]. None of these ever panic or return a `Result` —
//! failure is just a `{"status": "error", ...}` value the model sees as its
//! own tool result.

pub mod build;
pub mod crystallize;
pub mod decompose;
pub mod explore;
pub mod generation;
pub mod innovation;
pub mod interaction;
pub mod memory;
pub mod user_input;
pub mod validate;

use forge_domain::error::tool_error;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a tool call's JSON arguments into `T`, or a `VALIDATION_ERROR`
/// tool result if they don't match the schema.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, Value> {
    serde_json::from_value(args).map_err(|e| tool_error("VALIDATION_ERROR", format!("invalid arguments: {e}")))
}

pub(crate) fn ok(value: Value) -> Value {
    let mut obj = match value {
        Value::Object(map) => map,
        other => {
            let mut map = serde_json::Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    obj.entry("status".to_string()).or_insert(Value::String("ok".to_string()));
    Value::Object(obj)
}
