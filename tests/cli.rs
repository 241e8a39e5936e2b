//! CLI integration tests.
//!
//! These cover everything that is decided before the store is contacted:
//! target selection, manifest validation, confirmation, and settings.

mod support;
use support::*;

use predicates::prelude::*;

// --- selection ---

#[test]
fn test_pull_without_names_or_all() {
    let t = Test::with_manifest(MODES_MANIFEST);

    let output = t.pull(&[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "no secrets selected");
}

#[test]
fn test_all_conflicts_with_names() {
    let t = Test::with_manifest(MODES_MANIFEST);

    let output = t.pull(&["--all", "both-dev"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "--all cannot be combined");
}

#[test]
fn test_non_dev_name_rejected() {
    let t = Test::with_manifest(MODES_MANIFEST);

    let output = t.pull(&["database"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "must end with -dev");
}

#[test]
fn test_unknown_name_rejected() {
    let t = Test::with_manifest(MODES_MANIFEST);

    let output = t.pull(&["ghost-dev"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "'ghost-dev' is not in the manifest");
}

#[test]
fn test_mode_gate_applies_to_explicit_names() {
    let t = Test::with_manifest(MODES_MANIFEST);

    let output = t.push(&["pull-dev"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "cannot be used for push");

    let output = t.pull(&["push-dev"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "cannot be used for pull");
}

// --- push confirmation ---

#[test]
fn test_push_multiple_requires_yes() {
    let t = Test::with_manifest(MODES_MANIFEST);

    let output = t.push(&["--all"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "pushing 3 secrets requires --yes");

    let output = t.push(&["both-dev", "push-dev"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "pushing 2 secrets requires --yes");
}

#[test]
fn test_push_with_yes_passes_confirmation() {
    let t = Test::with_manifest(MODES_MANIFEST);

    let output = t.push(&["--all", "--yes"]);
    assert_failure(&output);
    assert_stderr_excludes(&output, "requires --yes");
    assert_stderr_contains(&output, "missing project ID");
}

#[test]
fn test_push_single_needs_no_confirmation() {
    let t = Test::with_manifest(MODES_MANIFEST);

    let output = t.push(&["both-dev", "both-dev"]);
    assert_failure(&output);
    assert_stderr_excludes(&output, "requires --yes");
}

// --- manifest ---

#[test]
fn test_missing_manifest() {
    let t = Test::new();

    let output = t.pull(&["a-dev"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "manifest not found");
    assert_stderr_contains(&output, "--manifest");
}

#[test]
fn test_custom_manifest_path() {
    let t = Test::new();
    t.write("conf/vault.json", MODES_MANIFEST);

    let output = t.pull(&["--manifest", "conf/vault.json", "ghost-dev"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "not in the manifest");
}

#[test]
fn test_manifest_with_prod_entry_rejected() {
    let t = Test::with_manifest(PROD_MANIFEST);

    let output = t.pull(&["--all"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "manifest entry 'db-prod'");
}

#[test]
fn test_legacy_mode_warns() {
    let t = Test::with_manifest(LEGACY_MANIFEST);

    let output = t.pull(&["old-dev"]);
    assert_stderr_contains(&output, "deprecated");
}

// --- settings ---

#[test]
fn test_missing_secret_key() {
    let t = Test::with_manifest(MODES_MANIFEST);

    let output = t.pull(&["both-dev", "--project-id", "proj"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "missing API secret key");
    assert_stderr_contains(&output, "SCW_SECRET_KEY");
}

#[test]
fn test_settings_file_supplies_project() {
    let t = Test::with_manifest(MODES_MANIFEST);
    std::fs::write(
        t.home.path().join("config.toml"),
        "project_id = \"from-file\"\n",
    )
    .unwrap();

    let output = t.pull(&["both-dev"]);
    assert_failure(&output);
    assert_stderr_excludes(&output, "missing project ID");
    assert_stderr_contains(&output, "missing API secret key");
}

#[test]
fn test_invalid_region() {
    let t = Test::with_manifest(MODES_MANIFEST);

    let output = t
        .cmd()
        .env("SCW_SECRET_KEY", "test-key")
        .args(["pull", "both-dev", "--project-id", "proj", "--region", "FR PAR"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid region");
}

#[test]
fn test_unreachable_store_is_transport_error() {
    let t = Test::with_manifest(MODES_MANIFEST);

    let output = t
        .cmd()
        .env("SCW_SECRET_KEY", "test-key")
        .args(["pull", "both-dev", "--project-id", "proj"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "list secrets failed");
    assert_stderr_excludes(&output, "test-key");
    assert!(!t.path("both.bin").exists());
}

// --- list ---

#[test]
fn test_list_invalid_regex() {
    let t = Test::new();

    let output = t.run(&["list", "--regex", "("]);
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid name regex");
}

#[test]
fn test_list_invalid_type() {
    let t = Test::new();

    let output = t.run(&["list", "--type", "password"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "unknown secret type 'password'");
}

// --- misc ---

#[test]
fn test_completions() {
    let t = Test::new();

    t.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dev-vault"));
}

#[test]
fn test_help_mentions_commands() {
    let t = Test::new();

    t.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pull"))
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_verbose_enables_debug_logs() {
    let t = Test::with_manifest(MODES_MANIFEST);

    let output = t.run(&["--verbose", "pull", "both-dev"]);
    assert_stderr_contains(&output, "loading manifest");

    let output = t.pull(&["both-dev"]);
    assert_stderr_excludes(&output, "loading manifest");
}

#[test]
fn test_log_env_var() {
    let t = Test::with_manifest(MODES_MANIFEST);

    let output = t
        .cmd()
        .env("DEV_VAULT_LOG", "dev_vault=debug")
        .args(["pull", "both-dev"])
        .output()
        .unwrap();
    assert_stderr_contains(&output, "loading manifest");
}
