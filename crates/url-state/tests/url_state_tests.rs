// crates/url-state/tests/url_state_tests.rs
//! Integration tests for URL state storage

use serde_json::json;
use statesync_core::BaseState;
use statesync_url::{
    get_state_from_url, is_state_hash, set_state_to_url, HashedItemStore, HistoryAction,
    MemoryHistory, MemorySessionStorage, SessionStorage, SetStateOptions, StateLocation,
    UrlControls,
};
use std::sync::Arc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn state(value: serde_json::Value) -> BaseState {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_two_keys_in_one_url() {
    init_logger();
    let hashed = HashedItemStore::in_memory();
    let app = state(json!({"columns": ["_source"], "sort": [["@timestamp", "desc"]]}));
    let global = state(json!({"time": {"from": "now-15m", "to": "now"}}));

    let url = set_state_to_url("_a", &app, SetStateOptions::default(), "http://host/app#/discover", &hashed)
        .unwrap();
    let url = set_state_to_url("_g", &global, SetStateOptions::default(), &url, &hashed).unwrap();

    assert_eq!(
        get_state_from_url("_a", &url, StateLocation::HashQuery, &hashed),
        Some(app)
    );
    assert_eq!(
        get_state_from_url("_g", &url, StateLocation::HashQuery, &hashed),
        Some(global)
    );
}

#[test]
fn test_strings_needing_escapes_survive_the_url() {
    let hashed = HashedItemStore::in_memory();
    let s = state(json!({
        "query": "status:open && owner:'me' #1 50%",
        "note": "don't!",
        "empty": ""
    }));

    let url = set_state_to_url("_a", &s, SetStateOptions::default(), "http://host/#/", &hashed).unwrap();
    assert!(!url[url.find('?').unwrap()..].contains(' '));
    assert_eq!(
        get_state_from_url("_a", &url, StateLocation::HashQuery, &hashed),
        Some(s)
    );
}

#[test]
fn test_hashed_state_is_lost_in_new_session() {
    init_logger();
    let s = state(json!({"a": 1}));
    let first = HashedItemStore::in_memory();
    let url = set_state_to_url(
        "_a",
        &s,
        SetStateOptions::hashed(StateLocation::HashQuery),
        "http://host/#/",
        &first,
    )
    .unwrap();

    let second = HashedItemStore::in_memory();
    assert!(get_state_from_url("_a", &url, StateLocation::HashQuery, &second).is_none());
    assert_eq!(
        get_state_from_url("_a", &url, StateLocation::HashQuery, &first),
        Some(s)
    );
}

#[test]
fn test_hashed_store_evicts_to_make_room() {
    init_logger();
    let storage = Arc::new(MemorySessionStorage::with_quota(200));
    let hashed = HashedItemStore::new(storage.clone());

    let mut hashes = Vec::new();
    for i in 0..10 {
        let s = state(json!({"index": i, "padding": "x".repeat(40)}));
        hashes.push(hashed.persist_state(&s).unwrap());
    }

    assert!(storage.used_bytes() <= 200);
    assert!(hashes.iter().all(|h| is_state_hash(h)));
    // the newest state is always kept
    let last = hashes.last().unwrap();
    assert!(hashed.retrieve_state(last).is_some());
    // the oldest ones were evicted
    assert!(hashed.retrieve_state(&hashes[0]).is_none());
    assert!(storage.keys().len() < 10);
}

#[tokio::test]
async fn test_batched_updates_notify_once() {
    init_logger();
    let controls = UrlControls::new(MemoryHistory::new("http://host/#/"));
    let mut rx = controls.listen();

    let a = controls.clone();
    let b = controls.clone();
    tokio::join!(
        a.update_async(|url| format!("{}?_a=(x:1)", url), false),
        b.update_async(|url| format!("{}&_g=(y:2)", url), false),
    );

    let update = rx.try_recv().unwrap();
    assert_eq!(update.location, "http://host/#/?_a=(x:1)&_g=(y:2)");
    assert_eq!(update.action, HistoryAction::Push);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_history_navigation_is_observable() {
    let history = MemoryHistory::new("http://host/#/?_a=(p:1)");
    let controls = UrlControls::new(history.clone());
    let hashed = HashedItemStore::in_memory();

    controls.update(
        |url| {
            set_state_to_url("_a", &state(json!({"p": 2})), SetStateOptions::default(), url, &hashed)
                .unwrap_or_else(|_| url.to_string())
        },
        false,
    );

    let mut rx = controls.listen();
    assert!(history.back());
    let update = rx.recv().await.unwrap();
    assert_eq!(update.action, HistoryAction::Pop);
    assert_eq!(
        get_state_from_url("_a", &update.location, StateLocation::HashQuery, &hashed),
        Some(state(json!({"p": 1})))
    );
}
