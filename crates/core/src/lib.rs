// crates/core/src/lib.rs
//! Shared state primitives for statesync
//!
//! Every crate in the workspace exchanges application state as a [`BaseState`]:
//! a JSON object keyed by field name. This crate owns that representation and
//! the equality rules the change detector relies on.
//!
//! # Example
//!
//! ```rust
//! use statesync_core::{shallow_equal, BaseState};
//! use serde_json::json;
//!
//! let a: BaseState = json!({"tab": "fields", "page": 1}).as_object().cloned().unwrap();
//! let b: BaseState = json!({"page": 1, "tab": "fields"}).as_object().cloned().unwrap();
//! assert!(shallow_equal(&a, &b));
//! ```

mod equality;
mod error;
mod state;

pub use equality::{same_value, same_value_f64, shallow_equal, shallow_equal_opt};
pub use error::{CoreError, CoreResult};
pub use state::{into_base_state, is_state_empty, BaseState};
