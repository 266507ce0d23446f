use super::*;
use statesync_url::StateLocation;

fn matches_for(args: &[&str]) -> ArgMatches {
    let mut argv = vec!["statesync"];
    argv.extend_from_slice(args);
    let matches = crate::build_cli()
        .try_get_matches_from(argv)
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();
    sub.clone()
}

#[test]
fn test_encode_json() {
    let text = encode_json(r#"{"query":"status:open","page":2,"pinned":true}"#).unwrap();
    assert_eq!(text, "(page:2,pinned:!t,query:'status:open')");
}

#[test]
fn test_encode_rejects_bad_json() {
    assert!(encode_json("{nope").is_err());
}

#[test]
fn test_decode_rison() {
    let json = decode_rison("(a:!(1,2),b:!n)").unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value, serde_json::json!({"a": [1, 2], "b": null}));
}

#[test]
fn test_decode_rejects_bad_rison() {
    assert!(decode_rison("(a:").is_err());
}

#[test]
fn test_parse_state_requires_object() {
    assert!(parse_state(r#"{"a":1}"#).is_ok());
    assert!(parse_state("[1,2]").is_err());
}

#[test]
fn test_parse_names() {
    assert_eq!(parse_strategy("hashed_url").unwrap(), SyncStrategyKind::HashedUrl);
    assert_eq!(parse_truth_source("none").unwrap(), InitialTruthSource::None);
    assert!(parse_truth_source("both").is_err());
}

#[test]
fn test_session_context_uses_config() {
    let mut config = Config::default();
    config.url.state_location = StateLocation::Query;
    let ctx = session_context(&config, "http://localhost/app#/");
    assert_eq!(ctx.location, StateLocation::Query);
    assert_eq!(ctx.controls.get_url(), "http://localhost/app#/");
}

#[test]
fn test_write_and_read_commands() {
    let config = Config::default();
    let write = matches_for(&[
        "write",
        "--url",
        "http://localhost/app#/",
        "--state",
        r#"{"tab":"indexed"}"#,
    ]);
    assert!(write_state(&config, &write).is_ok());

    let read = matches_for(&["read", "--url", "http://localhost/app#/?_a=(tab:indexed)"]);
    assert!(read_state(&config, &read).is_ok());
}

#[tokio::test]
async fn test_run_session() {
    let config = Config::default();
    let session = matches_for(&[
        "session",
        "--state",
        r#"{"page":1}"#,
        "--set",
        r#"{"page":2}"#,
        "--back",
        "--settle-ms",
        "20",
    ]);
    assert!(run_session(&config, &session).await.is_ok());
}

#[tokio::test]
async fn test_run_session_rejects_non_object_state() {
    let config = Config::default();
    let session = matches_for(&["session", "--state", "[1]"]);
    assert!(run_session(&config, &session).await.is_err());
}
