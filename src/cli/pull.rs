//! Pull command - write secrets from the store to local files.

use tracing::info;

use crate::cli::{self, output, GlobalArgs};
use crate::core::manifest::Direction;
use crate::core::select;
use crate::error::Result;

/// Pull the selected secrets.
pub fn execute(global: &GlobalArgs, names: &[String], all: bool, overwrite: bool) -> Result<()> {
    let manifest = cli::load_manifest(&global.manifest)?;
    let targets = select::select(&manifest, all, names, Direction::Pull)?;
    info!(targets = targets.len(), overwrite, "running pull");

    let service = cli::connect(global, manifest.root())?;
    let results = service.pull(&targets, overwrite)?;

    for result in &results {
        output::success(&format!(
            "pulled {} (revision {}) -> {}",
            output::key(&result.name),
            result.revision,
            output::path(result.file.display())
        ));
    }

    Ok(())
}
