// crates/config/tests/integration_tests.rs
//! Integration tests for the configuration system

use statesync_config::{Config, ConfigManager, ConfigSection, LogLevel, UrlSettings, CONFIG_VERSION};
use statesync_sync_engine::{InitialTruthSource, SyncStrategyKind};
use serde_json::json;
use statesync_url::StateLocation;
use std::fs;
use tempfile::TempDir;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup_test_manager() -> Result<(TempDir, ConfigManager), Box<dyn std::error::Error>> {
    init_logger();
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())?;
    Ok((temp_dir, manager))
}

#[test]
fn test_full_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    assert!(manager.initialize()?);

    let config = manager.load()?;
    assert_eq!(config.version, CONFIG_VERSION);

    let mut modified = config.clone();
    modified.app.log_level = LogLevel::Debug;
    modified.sync.default_strategy = SyncStrategyKind::HashedUrl;
    modified.url.state_location = StateLocation::Query;
    manager.save(&modified)?;

    let reloaded = manager.load()?;
    assert_eq!(reloaded, modified);

    manager.reset()?;
    assert_eq!(manager.load()?, Config::default());

    Ok(())
}

#[test]
fn test_written_file_is_readable_toml() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    manager.update(|config| {
        config.sync.initial_truth_source = InitialTruthSource::None;
    })?;

    let text = fs::read_to_string(manager.config_path())?;
    assert!(text.contains("[sync]"));
    assert!(text.contains("initial_truth_source = \"none\""));
    assert!(text.contains("state_location = \"hash_query\""));

    Ok(())
}

#[test]
fn test_atomic_save_keeps_backup() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    manager.save(&Config::default())?;
    manager.save(&Config::default())?;

    let backup_path = manager.config_path().with_extension("toml.backup");
    assert!(backup_path.exists());

    Ok(())
}

#[test]
fn test_corrupted_config_uses_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    fs::write(manager.config_path(), "this is not valid TOML {{{")?;

    assert!(manager.load().is_err());
    assert_eq!(manager.load_or_default(), Config::default());

    Ok(())
}

#[test]
fn test_invalid_save_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    let mut invalid = Config::default();
    invalid.url.session_storage_quota_bytes = 1;
    assert!(manager.save(&invalid).is_err());

    Ok(())
}

#[test]
fn test_section_names() {
    init_logger();
    let config = Config::default();
    assert_eq!(config.app.section_name(), "app");
    assert_eq!(config.sync.section_name(), "sync");
    assert_eq!(config.url.section_name(), "url");
}

#[test]
fn test_url_settings_drive_hashed_storage() {
    init_logger();
    let settings = UrlSettings {
        session_storage_quota_bytes: 1024,
        ..Default::default()
    };
    let store = settings.hashed_item_store();

    let mut big = serde_json::Map::new();
    big.insert("blob".to_string(), json!("x".repeat(2048)));
    assert!(store.persist_state(&big).is_err());

    let mut small = serde_json::Map::new();
    small.insert("tab".to_string(), json!("indexed"));
    assert!(store.persist_state(&small).is_ok());
}
