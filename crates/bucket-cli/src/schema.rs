//! # Schema Subcommand
//!
//! Prints the emitted JSON Schema of one contract, for client code
//! generators and API documentation.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use bucket_schema::{Contract, ContractRegistry};

use crate::ContractArgs;

/// Arguments for the `bucket schema` subcommand.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub target: ContractArgs,

    /// Print on a single line.
    #[arg(long)]
    pub compact: bool,
}

/// Execute the schema subcommand. Always returns 0 on success.
pub fn run_schema(args: &SchemaArgs, registry: &ContractRegistry) -> Result<u8> {
    let contract = args.target.lookup(registry)?;
    write_schema(contract, args.compact, &mut std::io::stdout().lock())?;
    Ok(0)
}

fn write_schema(contract: &dyn Contract, compact: bool, out: &mut impl Write) -> Result<()> {
    let mut document = contract.json_schema();
    if let Some(map) = document.as_object_mut() {
        map.insert(
            "$schema".to_string(),
            "https://json-schema.org/draft/2020-12/schema".into(),
        );
        map.insert("title".to_string(), contract.name().into());
    }
    let text = if compact {
        serde_json::to_string(&document)?
    } else {
        serde_json::to_string_pretty(&document)?
    };
    writeln!(out, "{text}")?;
    Ok(())
}
