// crates/core/src/equality.rs
//! Structural equality used to suppress no-op reconciliation cycles
//!
//! Numbers follow SameValue semantics rather than `==`: `+0` and `-0` are
//! different values and NaN is equal to itself. Everything else compares by
//! value, recursing into arrays and nested objects.

use crate::state::BaseState;
use serde_json::{Map, Number, Value};

/// SameValue comparison for floating point numbers
pub fn same_value_f64(x: f64, y: f64) -> bool {
    if x == y {
        // separates +0 from -0
        x != 0.0 || (1.0 / x) == (1.0 / y)
    } else {
        x.is_nan() && y.is_nan()
    }
}

/// SameValue comparison for JSON values
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => same_number(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| same_value(l, r))
        }
        (Value::Object(x), Value::Object(y)) => objects_equal(x, y),
        _ => false,
    }
}

/// Compares two states key by key
///
/// States are equal when they hold the same number of keys and every key of
/// `a` exists in `b` with a value that is [`same_value`]. Key order is
/// irrelevant.
pub fn shallow_equal(a: &BaseState, b: &BaseState) -> bool {
    objects_equal(a, b)
}

/// Like [`shallow_equal`] for possibly absent states; absent only equals absent
pub fn shallow_equal_opt(a: Option<&BaseState>, b: Option<&BaseState>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => shallow_equal(a, b),
        _ => false,
    }
}

fn objects_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter()
        .all(|(key, value)| b.get(key).is_some_and(|other| same_value(value, other)))
}

fn same_number(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }

    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => same_value_f64(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(value: Value) -> BaseState {
        value.as_object().cloned().unwrap()
    }

    fn float(x: f64) -> Value {
        Value::Number(Number::from_f64(x).unwrap())
    }

    #[test]
    fn test_signed_zero_differs() {
        assert!(!same_value_f64(0.0, -0.0));
        assert!(same_value_f64(-0.0, -0.0));
        assert!(!same_value(&float(0.0), &float(-0.0)));
    }

    #[test]
    fn test_nan_equals_itself() {
        assert!(same_value_f64(f64::NAN, f64::NAN));
        assert!(!same_value_f64(f64::NAN, 1.0));
    }

    #[test]
    fn test_integer_and_float_forms_agree() {
        assert!(same_value(&json!(1), &float(1.0)));
        assert!(!same_value(&json!(0), &float(-0.0)));
    }

    #[test]
    fn test_mixed_types_differ() {
        assert!(!same_value(&json!(1), &json!("1")));
        assert!(!same_value(&json!(null), &json!(false)));
        assert!(!same_value(&json!([]), &json!({})));
    }

    #[test]
    fn test_shallow_equal_ignores_key_order() {
        let a = state(json!({"a": 1, "b": "two"}));
        let b = state(json!({"b": "two", "a": 1}));
        assert!(shallow_equal(&a, &b));
    }

    #[test]
    fn test_shallow_equal_detects_missing_key() {
        let a = state(json!({"a": 1, "b": null}));
        let b = state(json!({"a": 1, "c": null}));
        assert!(!shallow_equal(&a, &b));
    }

    #[test]
    fn test_shallow_equal_detects_extra_key() {
        let a = state(json!({"a": 1}));
        let b = state(json!({"a": 1, "b": 2}));
        assert!(!shallow_equal(&a, &b));
        assert!(!shallow_equal(&b, &a));
    }

    #[test]
    fn test_nested_values_compare_structurally() {
        let a = state(json!({"filters": [{"field": "status", "value": "open"}]}));
        let b = state(json!({"filters": [{"field": "status", "value": "open"}]}));
        let c = state(json!({"filters": [{"field": "status", "value": "closed"}]}));
        assert!(shallow_equal(&a, &b));
        assert!(!shallow_equal(&a, &c));
    }

    #[test]
    fn test_shallow_equal_opt() {
        let a = state(json!({}));
        assert!(shallow_equal_opt(None, None));
        assert!(!shallow_equal_opt(Some(&a), None));
        assert!(!shallow_equal_opt(None, Some(&a)));
        assert!(shallow_equal_opt(Some(&a), Some(&a.clone())));
    }
}
