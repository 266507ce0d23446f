// crates/core/src/state.rs
//! The state representation shared by stores and storages

use crate::error::{CoreError, CoreResult};
use serde_json::{Map, Value};

/// Application state at an instant: unique keys mapped to serializable values
pub type BaseState = Map<String, Value>;

/// Converts a JSON value into state, rejecting anything that is not an object
pub fn into_base_state(value: Value) -> CoreResult<BaseState> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::NotAnObject(kind_of(&other).to_string())),
    }
}

/// Returns true if the state holds no keys
pub fn is_state_empty(state: &BaseState) -> bool {
    state.is_empty()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
