//! Secret store capability.
//!
//! The sync engine only talks to the store through the narrow `SecretApi`
//! trait, so no transport or vendor types leak into its signatures.
//!
//! ## Implementations
//!
//! - `ScalewayClient`: blocking HTTP client for the Secret Manager API.
//! - `MemoryStore`: in-process store for tests and embedders; the CLI never builds one.
//!
//! ## Adding a New Store
//!
//! 1. Implement the `SecretApi` trait
//! 2. Add the implementation in a new file
//! 3. Re-export from this module

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::Result;

mod memory;
mod scaleway;

pub use memory::MemoryStore;
pub use scaleway::ScalewayClient;

/// Revision selector for the store's mutable head pointer.
pub const LATEST_ENABLED: &str = "latest_enabled";

/// Secret types accepted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    Opaque,
    Certificate,
    KeyValue,
    BasicCredentials,
    DatabaseCredentials,
    SshKey,
}

impl SecretType {
    /// Every type, in the order listings sweep them.
    pub const ALL: [SecretType; 6] = [
        SecretType::Opaque,
        SecretType::Certificate,
        SecretType::KeyValue,
        SecretType::BasicCredentials,
        SecretType::DatabaseCredentials,
        SecretType::SshKey,
    ];

    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretType::Opaque => "opaque",
            SecretType::Certificate => "certificate",
            SecretType::KeyValue => "key_value",
            SecretType::BasicCredentials => "basic_credentials",
            SecretType::DatabaseCredentials => "database_credentials",
            SecretType::SshKey => "ssh_key",
        }
    }
}

impl std::fmt::Display for SecretType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SecretType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SecretType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = SecretType::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown secret type '{}' (expected one of {})", s, known.join(", "))
            })
    }
}

/// Where secrets live: a region and a project inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub region: String,
    pub project_id: String,
}

/// Identity metadata of a store-side secret. Holds no payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub secret_type: SecretType,
}

/// Status of a secret version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Enabled,
    Disabled,
    Deleted,
    #[serde(other)]
    Unknown,
}

/// One version of a secret, payload included.
///
/// `data` is the only place secret bytes live in memory. It is wiped on drop
/// and never shown by `Debug`.
#[derive(Clone)]
pub struct SecretVersion {
    pub secret_id: String,
    pub revision: u32,
    pub data: Zeroizing<Vec<u8>>,
    pub secret_type: Option<SecretType>,
    pub status: VersionStatus,
}

impl std::fmt::Debug for SecretVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretVersion")
            .field("secret_id", &self.secret_id)
            .field("revision", &self.revision)
            .field("data", &format_args!("<{} bytes redacted>", self.data.len()))
            .field("secret_type", &self.secret_type)
            .field("status", &self.status)
            .finish()
    }
}

/// One page of a secret listing.
#[derive(Debug, Clone, Default)]
pub struct SecretPage {
    pub secrets: Vec<SecretRecord>,
    pub total_count: usize,
}

/// Filter for a single `list_secrets` call. The store requires a type.
#[derive(Debug, Clone)]
pub struct ListSecretsRequest<'a> {
    pub region: &'a str,
    pub project_id: &'a str,
    pub name: Option<&'a str>,
    pub path: Option<&'a str>,
    pub secret_type: SecretType,
    pub page: u32,
    pub page_size: u32,
}

/// Parameters for creating a secret.
#[derive(Debug, Clone)]
pub struct CreateSecretRequest<'a> {
    pub region: &'a str,
    pub project_id: &'a str,
    pub name: &'a str,
    pub path: &'a str,
    pub secret_type: SecretType,
}

/// Parameters for adding a version to a secret.
pub struct CreateVersionRequest<'a> {
    pub region: &'a str,
    pub secret_id: &'a str,
    pub data: &'a [u8],
    pub description: Option<&'a str>,
    pub disable_previous: bool,
}

/// Secret store capability.
///
/// Implementations map transport failures to `StoreError` and must not
/// include payload bytes in any error or log event.
pub trait SecretApi {
    /// List one page of secrets of a single type.
    fn list_secrets(&self, req: &ListSecretsRequest<'_>) -> Result<SecretPage>;

    /// Fetch a version's payload. `revision` is a number or `LATEST_ENABLED`.
    fn access_secret_version(
        &self,
        region: &str,
        secret_id: &str,
        revision: &str,
    ) -> Result<SecretVersion>;

    /// Create an empty secret.
    fn create_secret(&self, req: &CreateSecretRequest<'_>) -> Result<SecretRecord>;

    /// Add a new version to an existing secret.
    fn create_secret_version(&self, req: &CreateVersionRequest<'_>) -> Result<SecretVersion>;
}

impl<T: SecretApi + ?Sized> SecretApi for &T {
    fn list_secrets(&self, req: &ListSecretsRequest<'_>) -> Result<SecretPage> {
        (**self).list_secrets(req)
    }

    fn access_secret_version(
        &self,
        region: &str,
        secret_id: &str,
        revision: &str,
    ) -> Result<SecretVersion> {
        (**self).access_secret_version(region, secret_id, revision)
    }

    fn create_secret(&self, req: &CreateSecretRequest<'_>) -> Result<SecretRecord> {
        (**self).create_secret(req)
    }

    fn create_secret_version(&self, req: &CreateVersionRequest<'_>) -> Result<SecretVersion> {
        (**self).create_secret_version(req)
    }
}
