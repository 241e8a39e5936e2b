//! List command - show -dev secrets in the store.

use regex::Regex;
use tracing::info;

use crate::cli::{self, output, GlobalArgs};
use crate::core::domain::ListQuery;
use crate::core::store::SecretType;
use crate::error::{ConfigError, Result, UsageError};

/// List secrets matching the given filters.
pub fn execute(
    global: &GlobalArgs,
    contains: Vec<String>,
    regex: Option<String>,
    path: Option<String>,
    secret_type: Option<String>,
    json: bool,
) -> Result<()> {
    let name_regex = regex
        .map(|r| Regex::new(&r).map_err(|e| UsageError::InvalidRegex(e.to_string())))
        .transpose()?;
    let secret_type = secret_type
        .map(|t| t.parse::<SecretType>())
        .transpose()
        .map_err(|reason| ConfigError::InvalidValue {
            field: "type",
            reason,
        })?;
    let query = ListQuery {
        name_contains: contains,
        name_regex,
        path,
        secret_type,
    };

    let root = std::env::current_dir()?;
    let service = cli::connect(global, &root)?;
    info!("listing secrets");
    let records = service.list(&query)?;

    if json {
        let result = serde_json::json!({
            "secrets": records,
            "count": records.len(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if records.is_empty() {
        output::dimmed("no matching -dev secrets");
    } else {
        println!();
        output::header(&format!("{} secrets", records.len()));
        output::rule();
        for record in &records {
            output::row(&record.name, &[&record.path, &record.secret_type, &record.id]);
        }
    }

    Ok(())
}
