//! Results and options of pull and push operations.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::store::SecretType;

/// Outcome of pulling one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullResult {
    pub name: String,
    /// Revision that was written.
    pub revision: u32,
    /// Local file that received the payload.
    pub file: PathBuf,
    #[serde(rename = "type")]
    pub secret_type: SecretType,
}

/// Outcome of pushing one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushResult {
    pub name: String,
    pub secret_id: String,
    /// Revision created by the push.
    pub revision: u32,
    /// Whether the secret itself had to be created first.
    pub created: bool,
}

/// Options for a push.
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Version description. Generated from time and host when `None`.
    pub description: Option<String>,
    /// Disable the previously enabled version.
    pub disable_previous: bool,
    /// Create secrets that are absent from the store.
    pub create_missing: bool,
}
