//! Push command - upload local files as new secret versions.

use tracing::info;

use crate::cli::{self, output, GlobalArgs};
use crate::core::domain::PushOptions;
use crate::core::manifest::Direction;
use crate::core::select;
use crate::error::{Result, UsageError};

/// Push flags from the command line.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub description: Option<String>,
    pub disable_previous: bool,
    pub create_missing: bool,
    pub yes: bool,
}

/// Push the selected secrets.
///
/// More than one target needs `--yes`; this is checked before settings are
/// resolved or the store is contacted.
pub fn execute(global: &GlobalArgs, names: &[String], all: bool, flags: Flags) -> Result<()> {
    let manifest = cli::load_manifest(&global.manifest)?;
    let targets = select::select(&manifest, all, names, Direction::Push)?;
    if targets.len() > 1 && !flags.yes {
        return Err(UsageError::ConfirmRequired(targets.len()).into());
    }
    info!(
        targets = targets.len(),
        disable_previous = flags.disable_previous,
        create_missing = flags.create_missing,
        "running push"
    );

    let service = cli::connect(global, manifest.root())?;
    let opts = PushOptions {
        description: flags.description,
        disable_previous: flags.disable_previous,
        create_missing: flags.create_missing,
    };
    let results = service.push(&targets, &opts).map_err(|e| {
        if e.is_not_found() && !opts.create_missing {
            output::hint("pass --create-missing to create it (the manifest entry needs a type)");
        }
        e
    })?;

    for result in &results {
        let action = if result.created { "created" } else { "pushed" };
        output::success(&format!(
            "{} {} (revision {})",
            action,
            output::key(&result.name),
            result.revision
        ));
    }

    Ok(())
}
