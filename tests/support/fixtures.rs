//! Test fixtures and constants.

/// Manifest with one entry per mode.
pub const MODES_MANIFEST: &str = r#"{
    "both-dev": { "file": "both.bin" },
    "pull-dev": { "file": "pull.bin", "mode": "pull" },
    "push-dev": { "file": "push.bin", "mode": "push" },
    "env-dev":  { "file": "config/app.env", "format": "dotenv", "type": "key_value" }
}"#;

/// Manifest using the legacy `sync` mode.
pub const LEGACY_MANIFEST: &str = r#"{
    "old-dev": { "file": "old.bin", "mode": "sync" }
}"#;

/// Manifest with an entry that is not a -dev secret.
pub const PROD_MANIFEST: &str = r#"{
    "db-prod": { "file": "db.bin" }
}"#;
