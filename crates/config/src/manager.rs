// crates/config/src/manager.rs
//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use std::path::PathBuf;
use std::str::FromStr;

/// Prefix of environment variables that override config values
pub const ENV_PREFIX: &str = "STATESYNC";

/// Loads, saves and validates the config file
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager over the platform config directory
    ///
    /// - Linux: `~/.config/statesync/`
    /// - macOS: `~/Library/Application Support/statesync/`
    /// - Windows: `%APPDATA%\statesync\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    /// Creates a manager over a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let config_path = config_dir.join("config.toml");
        let persistence = ConfigPersistence::new(config_path);

        Ok(Self {
            persistence,
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "statesync")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir("could not determine the user config directory"))
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Loads the configuration; a missing file yields defaults
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Validates and atomically saves the configuration
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads, modifies and saves the configuration
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use statesync_config::ConfigManager;
    /// # let manager = ConfigManager::new().unwrap();
    /// manager.update(|config| {
    ///     config.sync.store_in_session_storage = true;
    /// }).expect("Failed to update config");
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if none exists
    ///
    /// Returns Ok(true) if a new file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Generated default config at {}", self.config_path().display());
        Ok(true)
    }

    /// Overwrites the config file with defaults
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Returns every validation problem in the current file
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the configuration and applies environment overrides
    ///
    /// Variables follow the pattern `STATESYNC_SECTION_FIELD`, for example
    /// `STATESYNC_URL_MIN_HASH_LENGTH=12` or
    /// `STATESYNC_SYNC_DEFAULT_STRATEGY=hashed_url`. Unparsable values are
    /// ignored with a warning.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config);

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }
}

fn apply_env_overrides(config: &mut Config) {
    if let Some(v) = env_parsed::<LogLevel>("APP_LOG_LEVEL") {
        config.app.log_level = v;
    }
    if let Some(v) = env_parsed::<bool>("APP_DEBUG_MODE") {
        config.app.debug_mode = v;
    }

    if let Some(v) = env_enum("SYNC_DEFAULT_STRATEGY") {
        config.sync.default_strategy = v;
    }
    if let Some(v) = env_enum("SYNC_INITIAL_TRUTH_SOURCE") {
        config.sync.initial_truth_source = v;
    }
    if let Some(v) = env_parsed::<bool>("SYNC_STORE_IN_SESSION_STORAGE") {
        config.sync.store_in_session_storage = v;
    }

    if let Some(v) = env_enum("URL_STATE_LOCATION") {
        config.url.state_location = v;
    }
    if let Some(v) = env_parsed::<usize>("URL_MIN_HASH_LENGTH") {
        config.url.min_hash_length = v;
    }
    if let Some(v) = env_parsed::<usize>("URL_SESSION_STORAGE_QUOTA_BYTES") {
        config.url.session_storage_quota_bytes = v;
    }
    if let Some(v) = env_parsed::<usize>("URL_CHANGE_BUFFER") {
        config.url.change_buffer = v;
    }
}

fn env_var(name: &str) -> Option<(String, String)> {
    let var = format!("{}_{}", ENV_PREFIX, name);
    std::env::var(&var).ok().map(|value| (var, value))
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    let (var, raw) = env_var(name)?;
    match raw.trim().parse() {
        Ok(value) => {
            log::info!("Config override from {}", var);
            Some(value)
        }
        Err(_) => {
            log::warn!("Ignoring {}: cannot parse '{}'", var, raw);
            None
        }
    }
}

/// Parses a snake_case enum value using its serde names
fn env_enum<T: DeserializeOwned>(name: &str) -> Option<T> {
    let (var, raw) = env_var(name)?;
    let deserializer: StrDeserializer<'_, ValueError> = raw.trim().into_deserializer();
    match <T as serde::Deserialize>::deserialize(deserializer) {
        Ok(value) => {
            log::info!("Config override from {}", var);
            Some(value)
        }
        Err(e) => {
            log::warn!("Ignoring {}: {}", var, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statesync_sync_engine::{InitialTruthSource, SyncStrategyKind};
    use statesync_url::StateLocation;
    use tempfile::TempDir;

    fn setup_test_manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())
            .expect("Failed to create manager");
        (temp_dir, manager)
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let (_temp_dir, manager) = setup_test_manager();
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_update() {
        let (_temp_dir, manager) = setup_test_manager();
        manager.save(&Config::default()).expect("Should save");

        manager
            .update(|config| {
                config.sync.initial_truth_source = InitialTruthSource::Store;
            })
            .expect("Should update");

        let loaded = manager.load().expect("Should load");
        assert_eq!(loaded.sync.initial_truth_source, InitialTruthSource::Store);
    }

    #[test]
    fn test_initialize_creates_file_once() {
        let (_temp_dir, manager) = setup_test_manager();

        assert!(manager.initialize().expect("Should initialize"));
        assert!(manager.config_path().exists());
        assert!(!manager.initialize().expect("Should initialize"));
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.url.change_buffer = 512;
        manager.save(&config).expect("Should save");

        manager.reset().expect("Should reset");
        assert_eq!(manager.load().expect("Should load"), Config::default());
    }

    #[test]
    fn test_validate_reports_file_problems() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[url]\nchange_buffer = 0\n").expect("Should write");

        let errors = manager.validate().expect("Should validate");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("url.change_buffer"));
    }

    #[test]
    fn test_env_override_numbers_and_enums() {
        let (_temp_dir, manager) = setup_test_manager();

        std::env::set_var("STATESYNC_URL_MIN_HASH_LENGTH", "12");
        std::env::set_var("STATESYNC_SYNC_DEFAULT_STRATEGY", "hashed_url");
        std::env::set_var("STATESYNC_URL_STATE_LOCATION", "query");

        let config = manager
            .load_with_env_overrides()
            .expect("Should load with overrides");

        std::env::remove_var("STATESYNC_URL_MIN_HASH_LENGTH");
        std::env::remove_var("STATESYNC_SYNC_DEFAULT_STRATEGY");
        std::env::remove_var("STATESYNC_URL_STATE_LOCATION");

        assert_eq!(config.url.min_hash_length, 12);
        assert_eq!(config.sync.default_strategy, SyncStrategyKind::HashedUrl);
        assert_eq!(config.url.state_location, StateLocation::Query);
    }

    #[test]
    fn test_env_override_ignores_garbage() {
        let (_temp_dir, manager) = setup_test_manager();

        std::env::set_var("STATESYNC_URL_CHANGE_BUFFER", "lots");
        std::env::set_var("STATESYNC_SYNC_INITIAL_TRUTH_SOURCE", "both");

        let config = manager
            .load_with_env_overrides()
            .expect("Should load with overrides");

        std::env::remove_var("STATESYNC_URL_CHANGE_BUFFER");
        std::env::remove_var("STATESYNC_SYNC_INITIAL_TRUTH_SOURCE");

        assert_eq!(config.url.change_buffer, Config::default().url.change_buffer);
        assert_eq!(config.sync.initial_truth_source, InitialTruthSource::Storage);
    }

    #[test]
    fn test_config_file_path() {
        let (_temp_dir, manager) = setup_test_manager();
        assert!(manager.config_path().ends_with("config.toml"));
    }
}
