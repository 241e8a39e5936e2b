//! Secret listing query and output.

use regex::Regex;
use serde::Serialize;

use crate::core::store::{SecretRecord, SecretType};

/// Filters for listing secrets. All given filters must match.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Substrings the name must contain, all of them.
    pub name_contains: Vec<String>,
    pub name_regex: Option<Regex>,
    /// Exact store path.
    pub path: Option<String>,
    pub secret_type: Option<SecretType>,
}

impl ListQuery {
    /// Whether a record passes every filter.
    pub fn matches(&self, record: &SecretRecord) -> bool {
        self.path.as_deref().map_or(true, |p| record.path == p)
            && self.secret_type.map_or(true, |t| record.secret_type == t)
            && self
                .name_contains
                .iter()
                .all(|needle| record.name.contains(needle.as_str()))
            && self
                .name_regex
                .as_ref()
                .map_or(true, |re| re.is_match(&record.name))
    }
}

/// A listed secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRecord {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub secret_type: SecretType,
    pub id: String,
}

impl From<&SecretRecord> for ListRecord {
    fn from(record: &SecretRecord) -> Self {
        Self {
            name: record.name.clone(),
            path: record.path.clone(),
            secret_type: record.secret_type,
            id: record.id.clone(),
        }
    }
}
