//! Command-line interface.

pub mod completions;
pub mod list;
pub mod output;
pub mod pull;
pub mod push;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};

use crate::core::constants;
use crate::core::manifest::Manifest;
use crate::core::settings::{EnvSettings, FlagSettings, Settings, SettingsFile};
use crate::core::store::ScalewayClient;
use crate::core::sync::SyncService;
use crate::error::Result;

/// dev-vault - Sync *-dev secrets between Secret Manager and local files.
#[derive(Parser)]
#[command(
    name = "dev-vault",
    about = "Sync *-dev secrets between a cloud secret manager and local files",
    version,
    after_help = "Only secrets whose names end in -dev are ever read or written."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Manifest mapping secret names to local files
    #[arg(long, global = true, default_value = constants::MANIFEST_FILE)]
    pub manifest: PathBuf,

    /// Secret Manager region (default: fr-par)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Project holding the secrets
    #[arg(long, global = true)]
    pub project_id: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// List -dev secrets in the store
    List {
        /// Only names containing this text (repeatable, all must match)
        #[arg(long = "contains", value_name = "TEXT")]
        contains: Vec<String>,
        /// Only names matching this regular expression
        #[arg(long)]
        regex: Option<String>,
        /// Only secrets under this exact path
        #[arg(long)]
        path: Option<String>,
        /// Only secrets of this type
        #[arg(long = "type", value_name = "TYPE")]
        secret_type: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write secrets from the store to their local files
    Pull {
        /// Secret names from the manifest
        names: Vec<String>,
        /// Pull every manifest entry that allows pulling
        #[arg(long)]
        all: bool,
        /// Replace existing local files
        #[arg(long)]
        overwrite: bool,
    },

    /// Upload local files as new secret versions
    Push {
        /// Secret names from the manifest
        names: Vec<String>,
        /// Push every manifest entry that allows pushing
        #[arg(long)]
        all: bool,
        /// Version description (default: time and hostname)
        #[arg(short, long)]
        description: Option<String>,
        /// Disable the previously enabled version
        #[arg(long)]
        disable_previous: bool,
        /// Create secrets that do not exist yet (needs a type in the manifest)
        #[arg(long)]
        create_missing: bool,
        /// Confirm pushing more than one secret
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Execute a command.
pub fn execute(command: Command, global: &GlobalArgs) -> Result<()> {
    use Command::*;

    match command {
        List {
            contains,
            regex,
            path,
            secret_type,
            json,
        } => list::execute(global, contains, regex, path, secret_type, json),
        Pull {
            names,
            all,
            overwrite,
        } => pull::execute(global, &names, all, overwrite),
        Push {
            names,
            all,
            description,
            disable_previous,
            create_missing,
            yes,
        } => push::execute(
            global,
            &names,
            all,
            push::Flags {
                description,
                disable_previous,
                create_missing,
                yes,
            },
        ),
        Completions { shell } => completions::execute(shell),
    }
}

/// Load the manifest, surfacing normalization warnings.
pub(crate) fn load_manifest(path: &Path) -> Result<Manifest> {
    let (manifest, warnings) = Manifest::load(path)?;
    for warning in &warnings {
        warn!("{}", warning);
        output::warn(warning);
    }
    Ok(manifest)
}

/// Resolve settings and build a sync service rooted at `root`.
pub(crate) fn connect(global: &GlobalArgs, root: &Path) -> Result<SyncService<ScalewayClient>> {
    let file = match std::env::var_os("DEV_VAULT_CONFIG")
        .map(PathBuf::from)
        .or_else(SettingsFile::default_path)
    {
        Some(path) => SettingsFile::load(&path)?,
        None => SettingsFile::default(),
    };
    let flags = FlagSettings {
        region: global.region.clone(),
        project_id: global.project_id.clone(),
    };
    let settings = Settings::resolve(file, EnvSettings::from_env(), flags)?;
    debug!(
        region = %settings.scope.region,
        project_id = %settings.scope.project_id,
        "settings resolved"
    );

    let client = ScalewayClient::new(&settings.api_url, settings.secret_key)?;
    Ok(SyncService::new(client, settings.scope, root))
}
