//! Sync service.
//!
//! Orchestrates listing, pulling, and pushing `-dev` secrets. Every
//! operation builds a fresh `SecretIndex`, works through its targets in
//! order, and stops at the first failing target. Targets completed before a
//! failure are not rolled back.
//!
//! Payload bytes only ever pass through this module on their way between
//! the store and a file; they are never logged or put in an error.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::core::atomic;
use crate::core::constants;
use crate::core::domain::{ListQuery, ListRecord, PullResult, PushOptions, PushResult};
use crate::core::dotenv;
use crate::core::index::SecretIndex;
use crate::core::manifest::{self, Format, MappingEntry};
use crate::core::select::{ensure_dev_name, MappingTarget};
use crate::core::store::{
    CreateSecretRequest, CreateVersionRequest, Scope, SecretApi, SecretRecord, SecretType,
    LATEST_ENABLED,
};
use crate::error::{Error, FsError, Result, SecretError};

type Clock = Box<dyn Fn() -> DateTime<Utc>>;
type HostnameSource = Box<dyn Fn() -> Option<String>>;

/// Secret sync orchestrator.
pub struct SyncService<A> {
    api: A,
    scope: Scope,
    root: PathBuf,
    now: Clock,
    hostname: HostnameSource,
}

impl<A: SecretApi> SyncService<A> {
    /// Create a service for a store scope and project root.
    ///
    /// Uses the system clock and hostname for generated push descriptions;
    /// override them with `with_clock` and `with_hostname`.
    pub fn new(api: A, scope: Scope, root: impl Into<PathBuf>) -> Self {
        Self {
            api,
            scope,
            root: root.into(),
            now: Box::new(Utc::now),
            hostname: Box::new(|| whoami::fallible::hostname().ok()),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, now: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.now = Box::new(now);
        self
    }

    /// Replace the hostname source.
    pub fn with_hostname(mut self, hostname: impl Fn() -> Option<String> + 'static) -> Self {
        self.hostname = Box::new(hostname);
        self
    }

    /// The underlying store.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// List `-dev` secrets matching `query`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns the store error if any listing call fails.
    pub fn list(&self, query: &ListQuery) -> Result<Vec<ListRecord>> {
        let index = match query.secret_type {
            Some(t) => SecretIndex::build_for(&self.api, &self.scope, &[t])?,
            None => SecretIndex::build(&self.api, &self.scope)?,
        };

        let mut records: Vec<ListRecord> = index
            .records()
            .iter()
            .filter(|r| r.name.ends_with(constants::DEV_SUFFIX))
            .filter(|r| query.matches(r))
            .map(ListRecord::from)
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));

        debug!(count = records.len(), "listed secrets");
        Ok(records)
    }

    /// Pull each target's latest enabled version into its local file.
    ///
    /// Files are written atomically with mode `0600`; existing files are
    /// only replaced when `overwrite` is set.
    ///
    /// # Errors
    ///
    /// Returns the first failure, attributed to its target. Files written
    /// for earlier targets stay in place.
    pub fn pull(&self, targets: &[MappingTarget], overwrite: bool) -> Result<Vec<PullResult>> {
        ensure_dev_names(targets)?;
        let index = SecretIndex::build(&self.api, &self.scope)?;

        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            let result = self
                .pull_one(&index, target, overwrite)
                .map_err(|e| Error::for_target(&target.name, e))?;
            info!(
                name = %result.name,
                revision = result.revision,
                file = %result.file.display(),
                "pulled"
            );
            results.push(result);
        }
        Ok(results)
    }

    fn pull_one(
        &self,
        index: &SecretIndex,
        target: &MappingTarget,
        overwrite: bool,
    ) -> Result<PullResult> {
        let entry = &target.entry;
        let file = manifest::resolve_file(&self.root, &entry.file)?;
        let record = index.resolve(&target.name, &entry.path)?;
        check_type(&target.name, entry, record)?;

        debug!(name = %target.name, secret_id = %record.id, "accessing latest enabled version");
        let version =
            self.api
                .access_secret_version(&self.scope.region, &record.id, LATEST_ENABLED)?;

        let payload = match entry.format {
            Format::Raw => version.data.clone(),
            Format::Dotenv => Zeroizing::new(dotenv::json_to_dotenv(&version.data)?),
        };
        atomic::write(&file, &payload, constants::PULLED_FILE_MODE, overwrite)?;

        Ok(PullResult {
            name: target.name.clone(),
            revision: version.revision,
            file,
            secret_type: record.secret_type,
        })
    }

    /// Push each target's local file as a new secret version.
    ///
    /// # Errors
    ///
    /// Returns the first failure, attributed to its target. Versions
    /// created for earlier targets stay in place.
    pub fn push(&self, targets: &[MappingTarget], opts: &PushOptions) -> Result<Vec<PushResult>> {
        ensure_dev_names(targets)?;
        let index = SecretIndex::build(&self.api, &self.scope)?;
        let description = match &opts.description {
            Some(d) if !d.is_empty() => d.clone(),
            _ => self.default_description(),
        };

        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            let result = self
                .push_one(&index, target, opts, &description)
                .map_err(|e| Error::for_target(&target.name, e))?;
            info!(
                name = %result.name,
                revision = result.revision,
                created = result.created,
                "pushed"
            );
            results.push(result);
        }
        Ok(results)
    }

    fn push_one(
        &self,
        index: &SecretIndex,
        target: &MappingTarget,
        opts: &PushOptions,
        description: &str,
    ) -> Result<PushResult> {
        let entry = &target.entry;
        let file = manifest::resolve_file(&self.root, &entry.file)?;
        let contents = Zeroizing::new(fs::read(&file).map_err(|e| FsError::io(&file, e))?);

        let payload = match entry.format {
            Format::Raw => contents,
            Format::Dotenv => Zeroizing::new(dotenv::dotenv_to_json(&contents)?),
        };

        let (record, created) = match index.resolve(&target.name, &entry.path) {
            Ok(record) => {
                check_type(&target.name, entry, record)?;
                (record.clone(), false)
            }
            Err(e) if e.is_not_found() && opts.create_missing => {
                (self.create_secret(&target.name, entry)?, true)
            }
            Err(e) => return Err(e),
        };

        let version = self.api.create_secret_version(&CreateVersionRequest {
            region: &self.scope.region,
            secret_id: &record.id,
            data: &payload,
            description: Some(description),
            disable_previous: opts.disable_previous,
        })?;

        Ok(PushResult {
            name: target.name.clone(),
            secret_id: record.id,
            revision: version.revision,
            created,
        })
    }

    fn create_secret(&self, name: &str, entry: &MappingEntry) -> Result<SecretRecord> {
        let secret_type = entry
            .secret_type
            .ok_or_else(|| SecretError::MissingType(name.to_string()))?;

        info!(name, path = %entry.path, secret_type = %secret_type, "creating missing secret");
        self.api.create_secret(&CreateSecretRequest {
            region: &self.scope.region,
            project_id: &self.scope.project_id,
            name,
            path: &entry.path,
            secret_type,
        })
    }

    /// Description used when a push does not supply one:
    /// `dev-vault push <RFC3339 UTC time> <hostname>`.
    pub fn default_description(&self) -> String {
        let timestamp = (self.now)().to_rfc3339_opts(SecondsFormat::Secs, true);
        let host = (self.hostname)()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| constants::UNKNOWN_HOST.to_string());
        format!("{} {} {}", constants::DESCRIPTION_PREFIX, timestamp, host)
    }
}

fn ensure_dev_names(targets: &[MappingTarget]) -> Result<()> {
    targets.iter().try_for_each(|t| ensure_dev_name(&t.name))
}

fn check_type(name: &str, entry: &MappingEntry, record: &SecretRecord) -> Result<()> {
    match entry.secret_type {
        Some(expected) if expected != record.secret_type => Err(type_mismatch(
            name,
            expected,
            record.secret_type,
        )),
        _ => Ok(()),
    }
}

fn type_mismatch(name: &str, expected: SecretType, actual: SecretType) -> Error {
    SecretError::TypeMismatch {
        name: name.to_string(),
        expected,
        actual,
    }
    .into()
}
