//! # bucket CLI entry point
//!
//! Parses command-line arguments, builds the contract registry and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bucket_cli::audit::{run_audit, AuditArgs};
use bucket_cli::routes::{run_routes, RoutesArgs};
use bucket_cli::schema::{run_schema, SchemaArgs};
use bucket_cli::validate::{run_validate, ValidateArgs};

/// Request/response contracts of the bucket file-hosting service.
///
/// Lists routes, validates documents against route contracts, prints the
/// emitted JSON Schemas and audits them for open shapes.
#[derive(Parser, Debug)]
#[command(name = "bucket", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Deployment configuration (YAML or JSON). Defaults to the built-in
    /// deployment.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every resource route with its method, path and contracts.
    Routes(RoutesArgs),

    /// Validate a JSON or YAML document against one route contract.
    Validate(ValidateArgs),

    /// Print the JSON Schema of one route contract.
    Schema(SchemaArgs),

    /// Report object schemas that accept undeclared keys.
    Audit(AuditArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "bucket CLI starting");

    let result = bucket_cli::load_registry(cli.config.as_deref()).and_then(|registry| {
        match cli.command {
            Commands::Routes(args) => run_routes(&args, &registry),
            Commands::Validate(args) => run_validate(&args, &registry),
            Commands::Schema(args) => run_schema(&args, &registry),
            Commands::Audit(args) => run_audit(&args, &registry),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn validate_parses_contract_triple() {
        let cli = Cli::try_parse_from([
            "bucket", "-vv", "validate", "thumbnails", "get", "path", "doc.json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.target.resource, "thumbnails");
        assert_eq!(args.path, Some(PathBuf::from("doc.json")));
    }

    #[test]
    fn unknown_route_kind_rejected_by_parser() {
        assert!(Cli::try_parse_from(["bucket", "schema", "videos", "patch", "body"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["bucket", "audit", "--config", "deploy.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("deploy.yaml")));
    }
}
