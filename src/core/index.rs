//! Secret lookup index.
//!
//! Built once per operation from a full listing of the project, then used
//! to resolve every target without further list calls. The index is never
//! cached across operations.

use std::collections::HashMap;

use tracing::debug;

use crate::core::constants;
use crate::core::store::{ListSecretsRequest, Scope, SecretApi, SecretRecord, SecretType};
use crate::error::{Result, SecretError};

/// In-memory index of store secrets keyed by name and path.
#[derive(Debug, Default)]
pub struct SecretIndex {
    records: Vec<SecretRecord>,
    by_key: HashMap<String, Vec<usize>>,
}

// Names and paths never contain NUL.
fn key(name: &str, path: &str) -> String {
    format!("{}\0{}", name, path)
}

impl SecretIndex {
    /// Sweep every secret type and index the results.
    ///
    /// # Errors
    ///
    /// Returns the first store error; a failure on any type aborts the build.
    pub fn build<A: SecretApi + ?Sized>(api: &A, scope: &Scope) -> Result<Self> {
        Self::build_for(api, scope, &SecretType::ALL)
    }

    /// Index only secrets of the given types.
    pub fn build_for<A: SecretApi + ?Sized>(
        api: &A,
        scope: &Scope,
        types: &[SecretType],
    ) -> Result<Self> {
        let mut records = Vec::new();
        for &secret_type in types {
            list_all(api, scope, secret_type, &mut records)?;
        }
        debug!(secrets = records.len(), "secret index built");
        Ok(Self::from_records(records))
    }

    /// Index an already fetched listing.
    pub fn from_records(records: Vec<SecretRecord>) -> Self {
        let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            by_key.entry(key(&record.name, &record.path)).or_default().push(i);
        }
        Self { records, by_key }
    }

    /// Resolve exactly one secret by name and path.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::NotFound` when nothing matches and
    /// `SecretError::Ambiguous`, listing the sorted IDs, when more than one
    /// secret shares the name and path.
    pub fn resolve(&self, name: &str, path: &str) -> Result<&SecretRecord> {
        let matches = self
            .by_key
            .get(&key(name, path))
            .map(Vec::as_slice)
            .unwrap_or_default();

        match matches {
            [] => Err(SecretError::NotFound {
                name: name.to_string(),
                path: path.to_string(),
            }
            .into()),
            [only] => Ok(&self.records[*only]),
            many => {
                let mut ids: Vec<String> =
                    many.iter().map(|&i| self.records[i].id.clone()).collect();
                ids.sort();
                Err(SecretError::Ambiguous {
                    name: name.to_string(),
                    path: path.to_string(),
                    ids,
                }
                .into())
            }
        }
    }

    /// Every indexed record, in listing order.
    pub fn records(&self) -> &[SecretRecord] {
        &self.records
    }

    /// Number of indexed secrets.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store returned no secrets.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn list_all<A: SecretApi + ?Sized>(
    api: &A,
    scope: &Scope,
    secret_type: SecretType,
    out: &mut Vec<SecretRecord>,
) -> Result<()> {
    let mut page = 1;
    let mut fetched = 0;

    loop {
        let result = api.list_secrets(&ListSecretsRequest {
            region: &scope.region,
            project_id: &scope.project_id,
            name: None,
            path: None,
            secret_type,
            page,
            page_size: constants::LIST_PAGE_SIZE,
        })?;

        let count = result.secrets.len();
        fetched += count;
        out.extend(result.secrets);

        if count == 0 || fetched >= result.total_count {
            return Ok(());
        }
        page += 1;
    }
}
