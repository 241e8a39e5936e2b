//! In-process secret store.
//!
//! Not used by the command line, which always talks to the remote store.
//! It backs the library's tests and lets embedders exercise the sync engine
//! without network access. Behaves like the remote store for everything the sync engine relies on:
//! per-type filtered, paginated listings, revision numbering, the
//! `latest_enabled` head pointer, and disabling previous versions. Calls are
//! counted and individual operations can be made to fail.

use std::cell::RefCell;
use std::collections::HashSet;

use zeroize::Zeroizing;

use super::{
    CreateSecretRequest, CreateVersionRequest, ListSecretsRequest, SecretApi, SecretPage,
    SecretRecord, SecretType, SecretVersion, VersionStatus, LATEST_ENABLED,
};
use crate::error::{Result, StoreError};

struct StoredSecret {
    record: SecretRecord,
    region: String,
    versions: Vec<StoredVersion>,
}

struct StoredVersion {
    revision: u32,
    data: Zeroizing<Vec<u8>>,
    description: Option<String>,
    status: VersionStatus,
}

/// Counters for the calls a `MemoryStore` has served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: usize,
    pub access: usize,
    pub create_secret: usize,
    pub create_version: usize,
}

#[derive(Default)]
struct State {
    secrets: Vec<StoredSecret>,
    next_id: u64,
    calls: CallCounts,
    failing: HashSet<&'static str>,
    failing_types: HashSet<SecretType>,
}

/// In-memory `SecretApi` implementation.
#[derive(Default)]
pub struct MemoryStore {
    state: RefCell<State>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret without versions and return its ID.
    pub fn add_secret(
        &self,
        region: &str,
        project_id: &str,
        name: &str,
        path: &str,
        secret_type: SecretType,
    ) -> String {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = format!("{:08x}-0000-4000-8000-{:012x}", state.next_id, state.next_id);
        state.secrets.push(StoredSecret {
            record: SecretRecord {
                id: id.clone(),
                project_id: project_id.to_string(),
                name: name.to_string(),
                path: path.to_string(),
                secret_type,
            },
            region: region.to_string(),
            versions: Vec::new(),
        });
        id
    }

    /// Append an enabled version to a secret and return its revision.
    ///
    /// # Errors
    ///
    /// Returns a 404 `StoreError::Api` if `secret_id` is unknown.
    pub fn add_version(&self, secret_id: &str, data: &[u8]) -> Result<u32> {
        let mut state = self.state.borrow_mut();
        let secret = state
            .secrets
            .iter_mut()
            .find(|s| s.record.id == secret_id)
            .ok_or_else(|| not_found("add version", format!("secret {}", secret_id)))?;
        Ok(push_version(secret, data, None, false))
    }

    /// Payload of the newest enabled version of a secret.
    pub fn latest_data(&self, secret_id: &str) -> Option<Vec<u8>> {
        let state = self.state.borrow();
        let secret = state.secrets.iter().find(|s| s.record.id == secret_id)?;
        latest_enabled(secret).map(|v| v.data.to_vec())
    }

    /// Description attached to a given revision.
    pub fn description(&self, secret_id: &str, revision: u32) -> Option<String> {
        let state = self.state.borrow();
        let secret = state.secrets.iter().find(|s| s.record.id == secret_id)?;
        secret
            .versions
            .iter()
            .find(|v| v.revision == revision)
            .and_then(|v| v.description.clone())
    }

    /// Status of a given revision.
    pub fn version_status(&self, secret_id: &str, revision: u32) -> Option<VersionStatus> {
        let state = self.state.borrow();
        let secret = state.secrets.iter().find(|s| s.record.id == secret_id)?;
        secret
            .versions
            .iter()
            .find(|v| v.revision == revision)
            .map(|v| v.status)
    }

    /// Records matching a name.
    pub fn find(&self, name: &str) -> Vec<SecretRecord> {
        self.state
            .borrow()
            .secrets
            .iter()
            .filter(|s| s.record.name == name)
            .map(|s| s.record.clone())
            .collect()
    }

    /// Calls served so far.
    pub fn calls(&self) -> CallCounts {
        self.state.borrow().calls
    }

    /// Make an operation (`list`, `access`, `create_secret`,
    /// `create_version`) fail from now on.
    pub fn fail(&self, operation: &'static str) {
        self.state.borrow_mut().failing.insert(operation);
    }

    /// Make listings of one secret type fail from now on.
    pub fn fail_list_for(&self, secret_type: SecretType) {
        self.state.borrow_mut().failing_types.insert(secret_type);
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if self.state.borrow().failing.contains(operation) {
            return Err(StoreError::Unavailable {
                operation,
                reason: "injected failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn push_version(
    secret: &mut StoredSecret,
    data: &[u8],
    description: Option<String>,
    disable_previous: bool,
) -> u32 {
    if disable_previous {
        if let Some(previous) = secret
            .versions
            .iter_mut()
            .rev()
            .find(|v| v.status == VersionStatus::Enabled)
        {
            previous.status = VersionStatus::Disabled;
        }
    }
    let revision = secret.versions.last().map_or(1, |v| v.revision + 1);
    secret.versions.push(StoredVersion {
        revision,
        data: Zeroizing::new(data.to_vec()),
        description,
        status: VersionStatus::Enabled,
    });
    revision
}

fn latest_enabled(secret: &StoredSecret) -> Option<&StoredVersion> {
    secret
        .versions
        .iter()
        .rev()
        .find(|v| v.status == VersionStatus::Enabled)
}

fn not_found(operation: &'static str, what: String) -> crate::error::Error {
    StoreError::Api {
        operation,
        status: 404,
        message: format!("{} not found", what),
    }
    .into()
}

impl SecretApi for MemoryStore {
    fn list_secrets(&self, req: &ListSecretsRequest<'_>) -> Result<SecretPage> {
        self.state.borrow_mut().calls.list += 1;
        self.check("list")?;
        if self.state.borrow().failing_types.contains(&req.secret_type) {
            return Err(StoreError::Unavailable {
                operation: "list",
                reason: format!("injected failure for {}", req.secret_type),
            }
            .into());
        }

        let state = self.state.borrow();
        let matching: Vec<SecretRecord> = state
            .secrets
            .iter()
            .filter(|s| s.region == req.region && s.record.project_id == req.project_id)
            .filter(|s| s.record.secret_type == req.secret_type)
            .filter(|s| req.name.map_or(true, |n| s.record.name == n))
            .filter(|s| req.path.map_or(true, |p| s.record.path == p))
            .map(|s| s.record.clone())
            .collect();

        let page_size = req.page_size.max(1) as usize;
        let start = (req.page.max(1) as usize - 1) * page_size;
        Ok(SecretPage {
            total_count: matching.len(),
            secrets: matching.into_iter().skip(start).take(page_size).collect(),
        })
    }

    fn access_secret_version(
        &self,
        region: &str,
        secret_id: &str,
        revision: &str,
    ) -> Result<SecretVersion> {
        self.state.borrow_mut().calls.access += 1;
        self.check("access")?;

        let state = self.state.borrow();
        let secret = state
            .secrets
            .iter()
            .find(|s| s.record.id == secret_id && s.region == region)
            .ok_or_else(|| not_found("access", format!("secret {}", secret_id)))?;

        let found = if revision == LATEST_ENABLED {
            latest_enabled(secret)
        } else {
            let wanted: u32 = revision.parse().map_err(|_| StoreError::Api {
                operation: "access",
                status: 400,
                message: format!("invalid revision {}", revision),
            })?;
            secret.versions.iter().find(|v| v.revision == wanted)
        };
        let version = found
            .ok_or_else(|| not_found("access", format!("revision {} of {}", revision, secret_id)))?;

        Ok(SecretVersion {
            secret_id: secret.record.id.clone(),
            revision: version.revision,
            data: version.data.clone(),
            secret_type: Some(secret.record.secret_type),
            status: version.status,
        })
    }

    fn create_secret(&self, req: &CreateSecretRequest<'_>) -> Result<SecretRecord> {
        self.state.borrow_mut().calls.create_secret += 1;
        self.check("create_secret")?;

        let id = self.add_secret(
            req.region,
            req.project_id,
            req.name,
            req.path,
            req.secret_type,
        );
        Ok(SecretRecord {
            id,
            project_id: req.project_id.to_string(),
            name: req.name.to_string(),
            path: req.path.to_string(),
            secret_type: req.secret_type,
        })
    }

    fn create_secret_version(&self, req: &CreateVersionRequest<'_>) -> Result<SecretVersion> {
        self.state.borrow_mut().calls.create_version += 1;
        self.check("create_version")?;

        let mut state = self.state.borrow_mut();
        let secret = state
            .secrets
            .iter_mut()
            .find(|s| s.record.id == req.secret_id && s.region == req.region)
            .ok_or_else(|| not_found("create_version", format!("secret {}", req.secret_id)))?;

        let revision = push_version(
            secret,
            req.data,
            req.description.map(str::to_string),
            req.disable_previous,
        );
        Ok(SecretVersion {
            secret_id: secret.record.id.clone(),
            revision,
            data: Zeroizing::new(Vec::new()),
            secret_type: Some(secret.record.secret_type),
            status: VersionStatus::Enabled,
        })
    }
}
