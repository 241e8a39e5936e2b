//! Target selection.
//!
//! Turns a manifest plus the command line's `--all` / explicit names into
//! the list of targets one sync operation works on.

use std::collections::HashSet;

use crate::core::constants;
use crate::core::manifest::{Direction, Manifest, MappingEntry};
use crate::error::{Result, UsageError};

/// One selected unit of work: a secret name and its mapping entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTarget {
    pub name: String,
    pub entry: MappingEntry,
}

/// Reject names that do not carry the `-dev` suffix.
pub fn ensure_dev_name(name: &str) -> Result<()> {
    if name.ends_with(constants::DEV_SUFFIX) {
        Ok(())
    } else {
        Err(UsageError::NotDevName(name.to_string()).into())
    }
}

/// Select targets for a pull or push.
///
/// With `all`, every entry whose mode allows `direction` is selected, sorted
/// by name. Otherwise `names` are selected in first-seen order with
/// duplicates dropped; each must be a `-dev` name present in the manifest
/// with a mode that allows `direction`.
///
/// # Errors
///
/// Returns `UsageError` for conflicting or empty selections, non-dev names,
/// names missing from the manifest, and entries whose mode forbids the
/// direction.
pub fn select(
    manifest: &Manifest,
    all: bool,
    names: &[String],
    direction: Direction,
) -> Result<Vec<MappingTarget>> {
    match (all, names.is_empty()) {
        (true, false) => return Err(UsageError::AllWithNames.into()),
        (false, true) => return Err(UsageError::NothingSelected.into()),
        _ => {}
    }

    if all {
        // Manifest entries iterate in name order.
        let targets: Vec<MappingTarget> = manifest
            .entries()
            .filter(|(_, entry)| entry.mode.allows(direction))
            .map(|(name, entry)| MappingTarget {
                name: name.clone(),
                entry: entry.clone(),
            })
            .collect();

        if targets.is_empty() {
            return Err(UsageError::NoEntriesFor(direction.to_string()).into());
        }
        return Ok(targets);
    }

    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            continue;
        }

        ensure_dev_name(name)?;
        let entry = manifest
            .get(name)
            .ok_or_else(|| UsageError::NotInManifest(name.clone()))?;
        if !entry.mode.allows(direction) {
            return Err(UsageError::ModeNotAllowed {
                name: name.clone(),
                mode: entry.mode.to_string(),
                direction: direction.to_string(),
            }
            .into());
        }

        targets.push(MappingTarget {
            name: name.clone(),
            entry: entry.clone(),
        });
    }

    Ok(targets)
}
