//! # bucket-cli: CLI for the Bucket Contracts
//!
//! Provides the `bucket` command-line interface over
//! [`bucket_schema::ContractRegistry`].
//!
//! ## Subcommands
//!
//! - `bucket routes`: route inventory.
//! - `bucket validate`: check a document against one contract.
//! - `bucket schema`: print an emitted JSON Schema.
//! - `bucket audit`: closed-shape audit of every contract.
//!
//! ```bash
//! bucket validate thumbnails get path params.json
//! echo '{"ok": false, "error": "gone"}' | bucket validate videos get response
//! bucket --config deploy.yaml audit
//! ```
//!
//! Exit codes: 0 success, 1 invalid document or audit findings,
//! 2 operational error.

pub mod audit;
pub mod routes;
pub mod schema;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use bucket_schema::{Contract, ContractRegistry, RouteKind, RoutePart, SchemaValidationError};

/// Build the registry from `config`, or the built-in deployment.
pub fn load_registry(config: Option<&Path>) -> Result<ContractRegistry> {
    match config {
        Some(path) => {
            tracing::info!(config = %path.display(), "loading contract config");
            ContractRegistry::from_config_path(path)
                .with_context(|| format!("failed to load contract config {}", path.display()))
        }
        None => ContractRegistry::builtin().context("failed to build built-in contracts"),
    }
}

/// Selects one contract: `<resource> <route> <part>`.
#[derive(Args, Debug, Clone)]
pub struct ContractArgs {
    /// Resource name (thumbnails, torrents, uploads, videos, ...).
    #[arg(value_name = "RESOURCE")]
    pub resource: String,

    /// Route kind (list, upload, get, delete, file, create, update).
    #[arg(value_name = "ROUTE")]
    pub route: RouteKind,

    /// Route part (path, query, body, response).
    #[arg(value_name = "PART")]
    pub part: RoutePart,
}

impl ContractArgs {
    /// Resolve the selected contract.
    pub fn lookup<'r>(&self, registry: &'r ContractRegistry) -> Result<&'r dyn Contract> {
        registry
            .contract(&self.resource, self.route, self.part)
            .ok_or_else(|| {
                SchemaValidationError::UnknownContract {
                    resource: self.resource.clone(),
                    route: self.route.to_string(),
                    part: self.part.to_string(),
                }
                .into()
            })
    }
}
