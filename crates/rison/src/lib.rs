// crates/rison/src/lib.rs
//! Rison encoder and parser
//!
//! Rison is a compact, URL-friendly rendering of JSON data:
//! - objects are `(key:value,...)`
//! - arrays are `!(value,...)`
//! - `!t`, `!f` and `!n` stand for true, false and null
//! - strings are bare when they are valid identifiers, otherwise `'quoted'`
//!   with `!` as the escape character
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//!
//! let value = json!({"query": "status:open", "page": 2, "pinned": true});
//! let text = statesync_rison::to_string(&value);
//! assert_eq!(text, "(page:2,pinned:!t,query:'status:open')");
//!
//! let decoded = statesync_rison::from_str(&text).expect("Failed to parse rison");
//! assert_eq!(decoded, value);
//! ```

mod encoder;
mod error;
mod parser;

pub use encoder::{is_id, to_string};
pub use error::{RisonError, RisonResult};
pub use parser::{from_str, MAX_DEPTH};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serializes any serde value to rison
pub fn encode<T: Serialize>(value: &T) -> RisonResult<String> {
    let json = serde_json::to_value(value)?;
    Ok(to_string(&json))
}

/// Parses rison text into any deserializable type
pub fn decode<T: DeserializeOwned>(text: &str) -> RisonResult<T> {
    let json = from_str(text)?;
    Ok(serde_json::from_value(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TableState {
        sort: Vec<String>,
        page: u32,
        filter: Option<String>,
    }

    #[test]
    fn test_typed_roundtrip() {
        let state = TableState {
            sort: vec!["name".to_string(), "asc".to_string()],
            page: 3,
            filter: None,
        };

        let text = encode(&state).unwrap();
        assert_eq!(text, "(filter:!n,page:3,sort:!(name,asc))");

        let decoded: TableState = decode(&text).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_decode_type_mismatch() {
        let result: RisonResult<TableState> = decode("(page:x)");
        assert!(matches!(result, Err(RisonError::Serde(_))));
    }
}
