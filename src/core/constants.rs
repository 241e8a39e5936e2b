//! Constants used throughout dev-vault.
//!
//! Centralizes magic strings and configuration values.

/// Default manifest file name, looked up in the current directory.
pub const MANIFEST_FILE: &str = "dev-vault.json";

/// Suffix every managed secret name must carry.
pub const DEV_SUFFIX: &str = "-dev";

/// Store path used when a mapping entry does not set one.
pub const DEFAULT_PATH: &str = "/";

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "fr-par";

/// Secret Manager API root.
pub const DEFAULT_API_URL: &str = "https://api.scaleway.com";

/// Permission bits for pulled files.
pub const PULLED_FILE_MODE: u32 = 0o600;

/// Page size for secret listings.
pub const LIST_PAGE_SIZE: u32 = 100;

/// Per-request timeout for store calls.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Directory under the user config dir holding `config.toml`.
pub const SETTINGS_DIR: &str = "dev-vault";

/// Settings file name.
pub const SETTINGS_FILE: &str = "config.toml";

/// Prefix of auto-generated push descriptions.
pub const DESCRIPTION_PREFIX: &str = "dev-vault push";

/// Hostname used in push descriptions when it cannot be determined.
pub const UNKNOWN_HOST: &str = "unknown-host";
