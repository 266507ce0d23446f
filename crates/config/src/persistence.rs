// crates/config/src/persistence.rs
//! File system persistence for configuration
//!
//! Writes go through a temporary file in the target directory and an atomic
//! rename, and the previous file is copied aside first.

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Reads and writes one config file
pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Loads configuration from file
    ///
    /// A missing file yields the default config. An empty or unparsable
    /// file is an error. Validation problems are only logged so a user can
    /// still fix the file by hand.
    pub fn load(&self) -> ConfigResult<Config> {
        if !self.config_path.exists() {
            log::info!(
                "Config file not found at {}, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&self.config_path)
            .map_err(ConfigError::io("read", &self.config_path))?;

        if contents.trim().is_empty() {
            return Err(ConfigError::Empty(self.config_path.clone()));
        }

        let mut config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.config_path.clone(),
            source,
        })?;

        if config.version != CONFIG_VERSION {
            log::warn!(
                "Config version {} differs from supported version {}, reading as-is",
                config.version,
                CONFIG_VERSION
            );
            config.version = CONFIG_VERSION;
        }

        if let Err(errors) = config.validate() {
            log::warn!("Loaded {}", ConfigError::Invalid(errors));
        }

        Ok(config)
    }

    /// Validates and saves configuration atomically
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;

        if let Some(parent) = self.config_path.parent() {
            self.ensure_directory_exists(parent)?;
        }

        if self.config_path.exists() {
            self.backup_config()?;
        }

        let toml_string = toml::to_string_pretty(config)?;

        let temp_file = self.create_temp_file()?;
        self.write_atomic(temp_file, &toml_string)?;

        log::info!("Config saved to {}", self.config_path.display());
        Ok(())
    }

    /// Path of the copy kept from the previous save
    pub fn backup_path(&self) -> PathBuf {
        self.config_path.with_extension("toml.backup")
    }

    fn ensure_directory_exists(&self, path: &Path) -> ConfigResult<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(ConfigError::io("create", path))?;
            log::info!("Created config directory: {}", path.display());
        }
        Ok(())
    }

    fn backup_config(&self) -> ConfigResult<()> {
        let backup_path = self.backup_path();
        fs::copy(&self.config_path, &backup_path)
            .map_err(ConfigError::io("back up", &self.config_path))?;
        log::debug!("Backed up config to {}", backup_path.display());
        Ok(())
    }

    fn create_temp_file(&self) -> ConfigResult<NamedTempFile> {
        let dir = self
            .config_path
            .parent()
            .ok_or(ConfigError::NoConfigDir("config path has no parent directory"))?;

        NamedTempFile::new_in(dir).map_err(ConfigError::io("create a temporary file in", dir))
    }

    fn write_atomic(&self, mut temp_file: NamedTempFile, content: &str) -> ConfigResult<()> {
        let temp_path = temp_file.path().to_path_buf();
        let write = ConfigError::io("write", &temp_path);
        temp_file
            .write_all(content.as_bytes())
            .and_then(|()| temp_file.flush())
            .map_err(write)?;

        temp_file
            .persist(&self.config_path)
            .map_err(|e| ConfigError::io("replace", &self.config_path)(e.error))?;

        Ok(())
    }
}
