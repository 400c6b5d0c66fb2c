//! # Validate Subcommand
//!
//! Checks one JSON or YAML document against one route contract. The
//! document is read from PATH, or from stdin when PATH is omitted.
//!
//! Prints `OK:` or `FAIL:` followed by every violation. With `--emit`, the
//! accepted value (after numeric coercion) is printed as JSON.

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use bucket_schema::{load_document, parse_document, Contract, ContractRegistry, SchemaValidationError};

use crate::ContractArgs;

/// Arguments for the `bucket validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub target: ContractArgs,

    /// Document to validate. Reads stdin when omitted.
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Print the accepted value after coercion.
    #[arg(long)]
    pub emit: bool,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when the document is valid, 1 when it is not.
pub fn run_validate(args: &ValidateArgs, registry: &ContractRegistry) -> Result<u8> {
    let contract = args.target.lookup(registry)?;

    let (origin, document) = match &args.path {
        Some(path) => (path.display().to_string(), load_document(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read document from stdin")?;
            ("<stdin>".to_string(), parse_document(&text, "<stdin>")?)
        }
    };

    tracing::debug!(contract = contract.name(), %origin, "validating document");
    report(contract, &origin, &document, args.emit, &mut std::io::stdout().lock())
}

/// Validate `document` and write the outcome to `out`.
fn report(
    contract: &dyn Contract,
    origin: &str,
    document: &Value,
    emit: bool,
    out: &mut impl Write,
) -> Result<u8> {
    match contract.validate(document) {
        Ok(value) => {
            writeln!(out, "OK: {origin} ({})", contract.name())?;
            if emit {
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
            }
            Ok(0)
        }
        Err(SchemaValidationError::ValidationFailed { violations, .. }) => {
            writeln!(
                out,
                "FAIL: {origin} ({}): {} violation(s)",
                contract.name(),
                violations.len()
            )?;
            for violation in violations.violations() {
                writeln!(out, "{violation}")?;
            }
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}
