//! Manifest loading and project path resolution.
//!
//! The manifest (`dev-vault.json`) maps secret names to local files and
//! sync policy:
//!
//! ```json
//! {
//!   "api-dev": { "file": "config/api.env", "format": "dotenv", "type": "key_value" },
//!   "tls-dev": { "file": "certs/tls.pem", "mode": "pull", "path": "/certs" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::core::store::SecretType;
use crate::error::{ManifestError, Result};

/// How a secret's payload is represented in its local file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Raw,
    Dotenv,
}

/// Which directions a mapping entry may be synced in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Pull,
    Push,
    #[default]
    Both,
}

impl Mode {
    /// Whether this mode permits syncing in `direction`.
    pub fn allows(self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Mode::Both, _) | (Mode::Pull, Direction::Pull) | (Mode::Push, Direction::Push)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Pull => "pull",
            Mode::Push => "push",
            Mode::Both => "both",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a sync operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Pull,
    Push,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::Pull => "pull",
            Direction::Push => "push",
        })
    }
}

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingEntry {
    /// Local file, relative to the project root.
    pub file: String,
    pub format: Format,
    /// Store namespace.
    pub path: String,
    pub mode: Mode,
    /// Expected secret type, checked against the store.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<SecretType>,
}

impl MappingEntry {
    /// Entry with default format, path, and mode.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            format: Format::default(),
            path: constants::DEFAULT_PATH.to_string(),
            mode: Mode::default(),
            secret_type: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    file: String,
    #[serde(default)]
    format: Format,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(rename = "type", default)]
    secret_type: Option<String>,
}

/// Loaded, validated manifest.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: BTreeMap<String, MappingEntry>,
    root: PathBuf,
}

impl Manifest {
    /// Build a manifest from entries.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, MappingEntry)>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            root: root.into(),
        }
    }

    /// Load and validate a manifest file.
    ///
    /// Returns the manifest and any normalization warnings (e.g. the legacy
    /// `sync` mode). The file's directory becomes the project root.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError` if the file is missing, malformed, or any
    /// entry fails validation.
    pub fn load(path: &Path) -> Result<(Self, Vec<String>)> {
        debug!(path = %path.display(), "loading manifest");

        if !path.exists() {
            return Err(ManifestError::NotFound(path.to_path_buf()).into());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let root = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let (manifest, warnings) = Self::parse(&contents, root).map_err(|e| match e {
            crate::error::Error::Json(source) => ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            }
            .into(),
            other => other,
        })?;

        debug!(entries = manifest.len(), "manifest loaded");
        Ok((manifest, warnings))
    }

    /// Parse and validate manifest JSON.
    pub fn parse(contents: &str, root: impl Into<PathBuf>) -> Result<(Self, Vec<String>)> {
        let raw: BTreeMap<String, RawEntry> = serde_json::from_str(contents)?;
        let mut warnings = Vec::new();
        let mut entries = BTreeMap::new();

        for (name, raw) in raw {
            let entry = normalize(&name, raw, &mut warnings)?;
            entries.insert(name, entry);
        }

        Ok((
            Self {
                entries,
                root: root.into(),
            },
            warnings,
        ))
    }

    /// Look up an entry by secret name.
    pub fn get(&self, name: &str) -> Option<&MappingEntry> {
        self.entries.get(name)
    }

    /// All entries, sorted by name.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &MappingEntry)> {
        self.entries.iter()
    }

    /// Project root that entry files are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of mapping entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest maps nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(name: &str, raw: RawEntry, warnings: &mut Vec<String>) -> Result<MappingEntry> {
    let invalid = |reason: String| ManifestError::InvalidEntry {
        name: name.to_string(),
        reason,
    };

    if !name.ends_with(constants::DEV_SUFFIX) {
        return Err(invalid(format!("name must end with {}", constants::DEV_SUFFIX)).into());
    }

    if raw.file.trim().is_empty() {
        return Err(invalid("file must not be empty".to_string()).into());
    }
    if Path::new(&raw.file).is_absolute() {
        return Err(invalid("file must be a relative path".to_string()).into());
    }

    let path = raw
        .path
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| constants::DEFAULT_PATH.to_string());
    if !path.starts_with('/') {
        return Err(invalid(format!("path '{}' must start with /", path)).into());
    }

    let mode = match raw.mode.as_deref() {
        None | Some("") | Some("both") => Mode::Both,
        Some("pull") => Mode::Pull,
        Some("push") => Mode::Push,
        Some("sync") => {
            warnings.push(format!(
                "{}: mode \"sync\" is deprecated, use \"both\"",
                name
            ));
            Mode::Both
        }
        Some(other) => {
            return Err(invalid(format!(
                "unknown mode '{}' (expected pull, push, or both)",
                other
            ))
            .into())
        }
    };

    let secret_type = raw
        .secret_type
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<SecretType>())
        .transpose()
        .map_err(invalid)?;

    Ok(MappingEntry {
        file: raw.file,
        format: raw.format,
        path,
        mode,
        secret_type,
    })
}

/// Resolve an entry's file against the project root.
///
/// The path is normalized lexically; absolute paths and anything that
/// climbs out of `root` are rejected.
///
/// # Errors
///
/// Returns `ManifestError::OutsideRoot` if the file would land outside root.
pub fn resolve_file(root: &Path, file: &str) -> Result<PathBuf> {
    let outside = || ManifestError::OutsideRoot {
        file: file.to_string(),
    };

    let mut relative = PathBuf::new();
    for component in Path::new(file).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return Err(outside().into());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(outside().into()),
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(outside().into());
    }

    Ok(root.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    fn parse(json: &str) -> Result<(Manifest, Vec<String>)> {
        Manifest::parse(json, "/project")
    }

    #[test]
    fn test_defaults_applied() {
        let (manifest, warnings) = parse(r#"{"a-dev": {"file": "a.bin"}}"#).unwrap();
        let entry = manifest.get("a-dev").unwrap();

        assert!(warnings.is_empty());
        assert_eq!(entry, &MappingEntry::new("a.bin"));
        assert_eq!(entry.path, "/");
        assert_eq!(entry.mode, Mode::Both);
        assert_eq!(entry.format, Format::Raw);
    }

    #[test]
    fn test_full_entry() {
        let (manifest, _) = parse(
            r#"{"api-dev": {"file": "api.env", "format": "dotenv", "path": "/app", "mode": "pull", "type": "key_value"}}"#,
        )
        .unwrap();
        let entry = manifest.get("api-dev").unwrap();

        assert_eq!(entry.format, Format::Dotenv);
        assert_eq!(entry.path, "/app");
        assert_eq!(entry.mode, Mode::Pull);
        assert_eq!(entry.secret_type, Some(SecretType::KeyValue));
    }

    #[test]
    fn test_legacy_sync_mode_warns() {
        let (manifest, warnings) = parse(r#"{"a-dev": {"file": "a", "mode": "sync"}}"#).unwrap();

        assert_eq!(manifest.get("a-dev").unwrap().mode, Mode::Both);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("deprecated"));
    }

    #[test]
    fn test_rejects_invalid_entries() {
        for json in [
            r#"{"prod-secret": {"file": "a"}}"#,
            r#"{"a-dev": {"file": ""}}"#,
            r#"{"a-dev": {"file": "/etc/passwd"}}"#,
            r#"{"a-dev": {"file": "a", "path": "relative"}}"#,
            r#"{"a-dev": {"file": "a", "mode": "sideways"}}"#,
            r#"{"a-dev": {"file": "a", "type": "password"}}"#,
        ] {
            let err = parse(json).unwrap_err();
            assert!(
                matches!(err, Error::Manifest(ManifestError::InvalidEntry { .. })),
                "{} -> {}",
                json,
                err
            );
        }
    }

    #[test]
    fn test_rejects_unknown_format_and_fields() {
        assert!(parse(r#"{"a-dev": {"file": "a", "format": "yaml"}}"#).is_err());
        assert!(parse(r#"{"a-dev": {"file": "a", "colour": "blue"}}"#).is_err());
    }

    #[test]
    fn test_mode_allows() {
        assert!(Mode::Both.allows(Direction::Pull));
        assert!(Mode::Both.allows(Direction::Push));
        assert!(Mode::Pull.allows(Direction::Pull));
        assert!(!Mode::Pull.allows(Direction::Push));
        assert!(Mode::Push.allows(Direction::Push));
        assert!(!Mode::Push.allows(Direction::Pull));
    }

    #[test]
    fn test_resolve_file() {
        let root = Path::new("/project");

        assert_eq!(
            resolve_file(root, "config/./a.env").unwrap(),
            PathBuf::from("/project/config/a.env")
        );
        assert_eq!(
            resolve_file(root, "config/../b.env").unwrap(),
            PathBuf::from("/project/b.env")
        );
        for bad in ["../outside", "a/../../x", "/etc/passwd", ".", "a/.."] {
            assert!(
                matches!(
                    resolve_file(root, bad).unwrap_err(),
                    Error::Manifest(ManifestError::OutsideRoot { .. })
                ),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_load_uses_manifest_dir_as_root() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dev-vault.json");
        std::fs::write(&path, r#"{"a-dev": {"file": "a.bin"}}"#).unwrap();

        let (manifest, _) = Manifest::load(&path).unwrap();

        assert_eq!(manifest.root(), tmp.path());
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_load_errors() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.json");
        assert!(matches!(
            Manifest::load(&missing).unwrap_err(),
            Error::Manifest(ManifestError::NotFound(_))
        ));

        let broken = tmp.path().join("broken.json");
        std::fs::write(&broken, "{not json").unwrap();
        assert!(matches!(
            Manifest::load(&broken).unwrap_err(),
            Error::Manifest(ManifestError::Parse { .. })
        ));
    }
}
