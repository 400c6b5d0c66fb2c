//! # Routes Subcommand
//!
//! Prints the route inventory of the deployment: method, full path, route
//! kind and the parts that carry a contract.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use bucket_schema::{ContractRegistry, RouteEntry};

/// Arguments for the `bucket routes` subcommand.
#[derive(Args, Debug)]
pub struct RoutesArgs {
    /// Only list routes of this resource.
    #[arg(long)]
    pub resource: Option<String>,
}

/// Execute the routes subcommand.
///
/// Returns 1 when `--resource` names no declared resource.
pub fn run_routes(args: &RoutesArgs, registry: &ContractRegistry) -> Result<u8> {
    let rows: Vec<RouteEntry> = registry
        .route_table()
        .into_iter()
        .filter(|row| args.resource.as_deref().map_or(true, |r| row.resource == r))
        .collect();

    if rows.is_empty() {
        if let Some(resource) = &args.resource {
            println!("no routes for resource \"{resource}\"");
            return Ok(1);
        }
    }

    write_table(&rows, &mut std::io::stdout().lock())?;
    Ok(0)
}

fn write_table(rows: &[RouteEntry], out: &mut impl Write) -> Result<()> {
    let width = rows.iter().map(|r| r.path.len()).max().unwrap_or(0);
    for row in rows {
        let parts: Vec<&str> = row.parts.iter().map(|p| p.as_str()).collect();
        let parts = if parts.is_empty() {
            "-".to_string()
        } else {
            parts.join(",")
        };
        writeln!(
            out,
            "{:<6} {:<width$}  {:<7} {}",
            row.method,
            row.path,
            row.kind.as_str(),
            parts,
        )?;
    }
    Ok(())
}
