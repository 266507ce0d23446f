// crates/url-state/src/lib.rs
//! URL-backed state storage
//!
//! This crate provides everything the URL sync strategies need:
//! - [`AppUrl`]: a parsed application URL with query and fragment-query parameters
//! - [`MemoryHistory`]: a history stack that notifies listeners on every navigation
//! - [`UrlControls`]: immediate and batched URL updates on top of a history
//! - [`HashedItemStore`]: session-scoped storage for state referenced by a short hash
//! - [`get_state_from_url`] / [`set_state_to_url`]: reading and writing state parameters
//!
//! # Example
//!
//! ```rust
//! use statesync_url::{
//!     get_state_from_url, set_state_to_url, HashedItemStore, SetStateOptions, StateLocation,
//! };
//! use serde_json::json;
//!
//! let hashed = HashedItemStore::in_memory();
//! let state = json!({"tab": "indexed"}).as_object().cloned().unwrap();
//!
//! let url = set_state_to_url("_a", &state, SetStateOptions::default(), "http://localhost/app#/home", &hashed)
//!     .expect("Failed to write state");
//! assert_eq!(url, "http://localhost/app#/home?_a=(tab:indexed)");
//!
//! let read = get_state_from_url("_a", &url, StateLocation::HashQuery, &hashed);
//! assert_eq!(read, Some(state));
//! ```

mod controls;
mod error;
mod hash;
mod hashed_item_store;
mod history;
mod session_storage;
mod state_in_url;
mod url;

pub use controls::UrlControls;
pub use error::{UrlStateError, UrlStateResult};
pub use hash::{create_state_hash, is_state_hash, HASH_PREFIX, MIN_HASH_LENGTH};
pub use hashed_item_store::HashedItemStore;
pub use history::{HistoryAction, HistoryUpdate, MemoryHistory};
pub use session_storage::{MemorySessionStorage, SessionStorage, DEFAULT_QUOTA_BYTES};
pub use state_in_url::{
    encode_state_param, get_state_from_url, set_state_to_url, try_get_state_from_url,
    SetStateOptions,
};
pub use url::{encode_query_value, AppUrl, StateLocation};
