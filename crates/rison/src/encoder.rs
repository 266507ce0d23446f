// crates/rison/src/encoder.rs
//! Rison serialization

use serde_json::{Number, Value};

/// Characters that may never appear in a bare identifier
pub(crate) const NOT_ID_CHAR: &str = " '!:(),*@$";

/// Characters that may not start a bare identifier, besides [`NOT_ID_CHAR`]
pub(crate) const NOT_ID_START: &str = "-0123456789";

/// Encodes a JSON value as rison text
///
/// Object keys are written in sorted order so equal values always produce
/// equal text.
pub fn to_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// Returns true if `s` can be written without quotes
pub fn is_id(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        None => false,
        Some(first) if NOT_ID_START.contains(first) || NOT_ID_CHAR.contains(first) => false,
        Some(_) => chars.all(|c| !NOT_ID_CHAR.contains(c)),
    }
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("!n"),
        Value::Bool(true) => out.push_str("!t"),
        Value::Bool(false) => out.push_str("!f"),
        Value::Number(n) => write_number(n, out),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push_str("!(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(')');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('(');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(&map[key.as_str()], out);
            }
            out.push(')');
        }
    }
}

fn write_number(n: &Number, out: &mut String) {
    out.push_str(&n.to_string().replace("e+", "e"));
}

fn write_string(s: &str, out: &mut String) {
    if is_id(s) {
        out.push_str(s);
        return;
    }

    out.push('\'');
    for c in s.chars() {
        if c == '!' || c == '\'' {
            out.push('!');
        }
        out.push(c);
    }
    out.push('\'');
}
