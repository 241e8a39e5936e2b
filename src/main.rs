//! dev-vault - Sync development secrets with a cloud secret manager.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dev_vault::cli::output;
use dev_vault::cli::{execute, Cli};
use dev_vault::error::{ConfigError, Error, FsError, ManifestError, SecretError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("DEV_VAULT_LOG").unwrap_or_else(|_| {
        if cli.global.verbose {
            EnvFilter::new("dev_vault=debug")
        } else {
            EnvFilter::new("dev_vault=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    if let Err(e) = execute(cli.command, &cli.global) {
        let suggestion = match e.root() {
            Error::Manifest(ManifestError::NotFound(_)) => {
                Some("create dev-vault.json or pass --manifest")
            }
            Error::Config(ConfigError::Missing { .. }) => {
                Some("export SCW_SECRET_KEY and SCW_DEFAULT_PROJECT_ID")
            }
            Error::Secret(SecretError::Ambiguous { .. }) => {
                Some("remove or rename the duplicate secrets in the store")
            }
            Error::Fs(FsError::Exists(_)) => Some("pass --overwrite to replace existing files"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
