//! `validate` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use config_loader::ConfiguredOperators;
use contracts::{AuthConfig, RowcastBlueprint};
use ingestion::format_bytes;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    phone_column: String,
    delimited_max: String,
    spreadsheet_max: String,
    output_dir: String,
    gateway: Option<String>,
    operator_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(config: &Path, args: &ValidateArgs) -> Result<()> {
    info!(config = %config.display(), "Validating configuration");

    let result = validate_config(config);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(config: &Path) -> ValidationResult {
    let config_path = config.display().to_string();

    if !config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    phone_column: blueprint.columns.phone.clone(),
                    delimited_max: format_bytes(blueprint.limits.delimited_max_bytes),
                    spreadsheet_max: format_bytes(blueprint.limits.spreadsheet_max_bytes),
                    output_dir: blueprint.storage.output_dir.display().to_string(),
                    gateway: blueprint.gateway.as_ref().map(|g| g.send_url.clone()),
                    operator_count: blueprint.operators.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &RowcastBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.operators.is_empty() {
        warnings.push("No operators configured - every send will be refused".to_string());
    }
    for operator in &blueprint.operators {
        if has_guessable_password(&operator.username, &operator.password_sha256) {
            warnings.push(format!(
                "Operator {} uses a well-known password - change it before sending",
                operator.username
            ));
        }
    }

    match &blueprint.gateway {
        None => warnings.push("No gateway configured - only --dry-run sends are possible".to_string()),
        Some(gateway) => {
            let vars: Vec<&str> = match &gateway.auth {
                AuthConfig::Static { token_env } => vec![token_env.as_str()],
                AuthConfig::ClientCredentials {
                    client_id_env,
                    client_secret_env,
                    ..
                } => vec![client_id_env.as_str(), client_secret_env.as_str()],
            };
            for var in vars {
                if std::env::var(var).map_or(true, |v| v.trim().is_empty()) {
                    warnings.push(format!("Environment variable {} is not set", var));
                }
            }
        }
    }

    if blueprint.columns.identifier.is_none() {
        warnings.push("columns.identifier not set - reports use row numbers".to_string());
    }

    warnings
}

/// Passwords tried first by anyone guessing
const WELL_KNOWN_PASSWORDS: [&str; 5] = ["admin", "password", "123456", "changeme", "operator"];

fn has_guessable_password(username: &str, digest: &str) -> bool {
    std::iter::once(username)
        .chain(WELL_KNOWN_PASSWORDS)
        .any(|password| ConfiguredOperators::digest(password).eq_ignore_ascii_case(digest))
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Phone column: {}", summary.phone_column);
            println!(
                "  Size limits: {} (csv), {} (spreadsheet)",
                summary.delimited_max, summary.spreadsheet_max
            );
            println!("  Output: {}", summary.output_dir);
            println!(
                "  Gateway: {}",
                summary.gateway.as_deref().unwrap_or("(none)")
            );
            println!("  Operators: {}", summary.operator_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
