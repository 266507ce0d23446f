// crates/config/src/lib.rs
//! statesync configuration
//!
//! TOML configuration for the statesync tools. Each section implements
//! [`ConfigSection`], so validation and merging stay local to the section.
//!
//! - **Graceful degradation**: invalid files can fall back to defaults with warnings
//! - **Atomic writes**: config files are never left half written
//! - **Env overrides**: `STATESYNC_SECTION_FIELD` variables override file values
//!
//! # Example
//!
//! ```rust,no_run
//! use statesync_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! println!("Strategy: {:?}", config.sync.effective_strategy());
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

// Config sections
mod app_config;
mod sync_settings;
mod url_settings;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{ConfigManager, ENV_PREFIX};
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use sync_settings::SyncSettings;
pub use url_settings::UrlSettings;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Sync defaults
    pub sync: SyncSettings,

    /// URL and session storage layout
    pub url: UrlSettings,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates every section, returning all errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.sync.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.url.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    ///
    /// Override chain: defaults < file < env vars < CLI args
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.sync.merge(other.sync);
        self.url.merge(other.url);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            sync: SyncSettings::default(),
            url: UrlSettings::default(),
        }
    }
}
