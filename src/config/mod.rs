//! Configuration for the JIRA client.
//!
//! Profiles and client settings live in a TOML file under the platform
//! config directory (`<config_dir>/jira-rest-client/config.toml`). API tokens
//! are not stored here; see [`crate::api::get_token`].

mod profile;
mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub use profile::Profile;
pub use settings::Settings;

/// Directory name under the platform config directory.
const CONFIG_DIR_NAME: &str = "jira-rest-client";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    NoConfigDir,

    #[error("failed to create configuration directory: {0}")]
    CreateDirError(#[source] std::io::Error),

    #[error("failed to read configuration file: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("failed to write configuration file: {0}")]
    WriteError(#[source] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    ValidationError(String),

    #[error("profile '{0}' not found")]
    ProfileNotFound(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// The configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,
    pub profiles: Vec<Profile>,
}

impl Config {
    /// Path of the configuration file.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the configuration from [`Config::default_path`].
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load and validate the configuration at `path`.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;

        debug!(
            path = %path.display(),
            profiles = config.profiles.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Save the configuration to [`Config::default_path`].
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Validate and write the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(ConfigError::WriteError)?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Check settings and every profile.
    ///
    /// Profile names must be unique and the default profile, when set, must exist.
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;

        for (i, profile) in self.profiles.iter().enumerate() {
            profile.validate()?;

            if self.profiles[..i].iter().any(|p| p.name == profile.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }

        if let Some(name) = &self.settings.default_profile {
            if !self.profiles.iter().any(|p| &p.name == name) {
                return Err(ConfigError::ValidationError(format!(
                    "default profile '{}' is not defined",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))
    }

    /// The configured default profile, or the first profile when none is set.
    pub fn default_profile(&self) -> Result<&Profile> {
        match &self.settings.default_profile {
            Some(name) => self.profile(name),
            None => self
                .profiles
                .first()
                .ok_or_else(|| ConfigError::ProfileNotFound("default".to_string())),
        }
    }

    /// Add a profile, replacing one with the same name.
    pub fn upsert_profile(&mut self, profile: Profile) -> Result<()> {
        profile.validate()?;

        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
        Ok(())
    }

    /// Remove a profile. Clears the default when it pointed at this profile.
    pub fn remove_profile(&mut self, name: &str) -> Result<Profile> {
        let index = self
            .profiles
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))?;

        if self.settings.default_profile.as_deref() == Some(name) {
            self.settings.default_profile = None;
        }
        Ok(self.profiles.remove(index))
    }
}
