// crates/url-state/src/state_in_url.rs
//! Reading and writing state parameters

use crate::error::UrlStateResult;
use crate::hash::is_state_hash;
use crate::hashed_item_store::HashedItemStore;
use crate::url::{AppUrl, StateLocation};
use statesync_core::{into_base_state, BaseState};

/// How a state is written into the URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetStateOptions {
    /// Store the state in session storage and put only its hash in the URL
    pub use_hash: bool,
    /// Which part of the URL holds the parameter
    pub location: StateLocation,
}

impl SetStateOptions {
    pub fn hashed(location: StateLocation) -> Self {
        Self {
            use_hash: true,
            location,
        }
    }
}

/// Reads the state stored under `key`
///
/// `Ok(None)` means the parameter is missing or references a hash that is no
/// longer in session storage.
pub fn try_get_state_from_url(
    key: &str,
    url: &str,
    location: StateLocation,
    hashed: &HashedItemStore,
) -> UrlStateResult<Option<BaseState>> {
    let parsed = AppUrl::parse(url);
    let Some(raw) = parsed.param(location, key) else {
        return Ok(None);
    };

    if is_state_hash(raw) {
        let state = hashed.retrieve_state(raw);
        if state.is_none() {
            log::debug!("State hash {} for {} is not in session storage", raw, key);
        }
        return Ok(state);
    }

    let value = statesync_rison::from_str(raw)?;
    Ok(Some(into_base_state(value)?))
}

/// Reads the state stored under `key`, treating anything unreadable as absent
pub fn get_state_from_url(
    key: &str,
    url: &str,
    location: StateLocation,
    hashed: &HashedItemStore,
) -> Option<BaseState> {
    match try_get_state_from_url(key, url, location, hashed) {
        Ok(state) => state,
        Err(e) => {
            log::warn!("Ignoring unreadable state {} in URL: {}", key, e);
            None
        }
    }
}

/// Produces the parameter value for a state: its hash or its rison text
pub fn encode_state_param(
    state: &BaseState,
    use_hash: bool,
    hashed: &HashedItemStore,
) -> UrlStateResult<String> {
    if use_hash {
        hashed.persist_state(state)
    } else {
        Ok(statesync_rison::encode(state)?)
    }
}

/// Returns `url` with the state stored under `key`
pub fn set_state_to_url(
    key: &str,
    state: &BaseState,
    opts: SetStateOptions,
    url: &str,
    hashed: &HashedItemStore,
) -> UrlStateResult<String> {
    let value = encode_state_param(state, opts.use_hash, hashed)?;
    let mut parsed = AppUrl::parse(url);
    parsed.set_param(opts.location, key, &value);
    Ok(parsed.to_string())
}
