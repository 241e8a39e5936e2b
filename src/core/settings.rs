//! Store connection settings.
//!
//! Resolved in increasing precedence from `~/.config/dev-vault/config.toml`,
//! the environment, and command-line flags.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::core::constants;
use crate::core::store::Scope;
use crate::error::{ConfigError, Result};

/// Contents of the settings file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub region: Option<String>,
    pub project_id: Option<String>,
    pub api_url: Option<String>,
}

impl SettingsFile {
    /// Default location of the settings file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::SETTINGS_DIR).join(constants::SETTINGS_FILE))
    }

    /// Load a settings file; a missing file yields empty settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "settings file loaded");
        Ok(settings)
    }
}

/// Values taken from the environment.
#[derive(Debug, Default, Clone)]
pub struct EnvSettings {
    pub region: Option<String>,
    pub project_id: Option<String>,
    pub secret_key: Option<String>,
    pub api_url: Option<String>,
}

impl EnvSettings {
    /// Read the process environment.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            region: var("SCW_DEFAULT_REGION"),
            project_id: var("SCW_DEFAULT_PROJECT_ID"),
            secret_key: var("SCW_SECRET_KEY"),
            api_url: var("DEV_VAULT_API_URL"),
        }
    }
}

/// Command-line overrides.
#[derive(Debug, Default, Clone)]
pub struct FlagSettings {
    pub region: Option<String>,
    pub project_id: Option<String>,
}

/// Fully resolved settings.
#[derive(Clone)]
pub struct Settings {
    pub scope: Scope,
    pub api_url: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("scope", &self.scope)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Merge the three layers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no project ID or secret key is set,
    /// and `ConfigError::InvalidValue` for a malformed region.
    pub fn resolve(file: SettingsFile, env: EnvSettings, flags: FlagSettings) -> Result<Self> {
        let region = flags
            .region
            .or(env.region)
            .or(file.region)
            .unwrap_or_else(|| constants::DEFAULT_REGION.to_string());
        validate_region(&region)?;

        let project_id = flags
            .project_id
            .or(env.project_id)
            .or(file.project_id)
            .ok_or(ConfigError::Missing {
                what: "project ID",
                hint: "SCW_DEFAULT_PROJECT_ID or --project-id",
            })?;

        let secret_key = env.secret_key.ok_or(ConfigError::Missing {
            what: "API secret key",
            hint: "SCW_SECRET_KEY",
        })?;

        let api_url = env
            .api_url
            .or(file.api_url)
            .unwrap_or_else(|| constants::DEFAULT_API_URL.to_string());

        Ok(Self {
            scope: Scope { region, project_id },
            api_url,
            secret_key,
        })
    }
}

// Regions look like `fr-par`: lowercase letters, digits, and dashes.
fn validate_region(region: &str) -> Result<()> {
    let valid = !region.is_empty()
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: "region",
            reason: format!("'{}' is not a region name", region),
        }
        .into())
    }
}
