//! Error types for dev-vault.
//!
//! Errors are grouped by where they originate: target selection (usage),
//! secret resolution, the store transport, the local filesystem, and
//! configuration. None of them ever carry secret payload bytes.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::store::SecretType;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Dotenv(#[from] DotenvError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error attributed to the target that triggered it.
    #[error("{name}: {source}")]
    Target {
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Attach the name of the target this error belongs to.
    pub fn for_target(name: impl Into<String>, err: impl Into<Error>) -> Self {
        Error::Target {
            name: name.into(),
            source: Box::new(err.into()),
        }
    }

    /// The underlying error, with any target attribution removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Target { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error means the secret does not exist in the store.
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Error::Secret(SecretError::NotFound { .. }))
    }
}

/// Bad target selection or invocation. Raised before any store call.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UsageError {
    #[error("--all cannot be combined with explicit secret names")]
    AllWithNames,

    #[error("no secrets selected: pass secret names or --all")]
    NothingSelected,

    #[error("no mapping entries selected for {0}")]
    NoEntriesFor(String),

    #[error("refusing to operate on '{0}': secret names must end with -dev")]
    NotDevName(String),

    #[error("'{0}' is not in the manifest")]
    NotInManifest(String),

    #[error("'{name}' has mode {mode} and cannot be used for {direction}")]
    ModeNotAllowed {
        name: String,
        mode: String,
        direction: String,
    },

    #[error("pushing {0} secrets requires --yes")]
    ConfirmRequired(usize),

    #[error("invalid name regex: {0}")]
    InvalidRegex(String),
}

/// Problems resolving a secret in the store.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SecretError {
    #[error("secret not found: {name} (path {path})")]
    NotFound { name: String, path: String },

    #[error("ambiguous secret {name} (path {path}): matches {}", .ids.join(", "))]
    Ambiguous {
        name: String,
        path: String,
        ids: Vec<String>,
    },

    #[error("type mismatch for {name}: manifest expects {expected}, store has {actual}")]
    TypeMismatch {
        name: String,
        expected: SecretType,
        actual: SecretType,
    },

    #[error("cannot create {0}: the mapping entry does not declare a type")]
    MissingType(String),
}

/// Secret store transport failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{operation} failed: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} failed: HTTP {status}: {message}")]
    Api {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("{operation} returned an unreadable payload: {reason}")]
    Decode {
        operation: &'static str,
        reason: String,
    },

    #[error("{operation} failed: {reason}")]
    Unavailable {
        operation: &'static str,
        reason: String,
    },
}

/// Local filesystem failures: write conflicts, permissions, I/O.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("{} already exists (use --overwrite to replace it)", .0.display())]
    Exists(PathBuf),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to replace {}: rename failed ({first}), retry after removal failed ({retry})", .path.display())]
    Replace {
        path: PathBuf,
        first: std::io::Error,
        retry: std::io::Error,
    },
}

impl FsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FsError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Dotenv conversion failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DotenvError {
    #[error("expected JSON object")]
    NotAnObject,

    #[error("payload is not valid JSON")]
    InvalidJson,

    #[error("dotenv content is not valid UTF-8")]
    InvalidUtf8,

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Manifest loading and path resolution failures.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("manifest not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read manifest {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest entry '{name}': {reason}")]
    InvalidEntry { name: String, reason: String },

    #[error("{file} resolves outside the project root")]
    OutsideRoot { file: String },
}

/// Settings errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing {what}: set {hint}")]
    Missing {
        what: &'static str,
        hint: &'static str,
    },

    #[error("failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_attribution_preserves_kind() {
        let err = Error::for_target(
            "api-dev",
            SecretError::NotFound {
                name: "api-dev".to_string(),
                path: "/".to_string(),
            },
        );

        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "api-dev: secret not found: api-dev (path /)"
        );
    }

    #[test]
    fn test_ambiguous_lists_ids() {
        let err = SecretError::Ambiguous {
            name: "db-dev".to_string(),
            path: "/".to_string(),
            ids: vec!["a".to_string(), "b".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "ambiguous secret db-dev (path /): matches a, b"
        );
    }

    #[test]
    fn test_other_errors_are_not_not_found() {
        let err: Error = UsageError::NothingSelected.into();
        assert!(!err.is_not_found());
    }
}
