//! # Contract Registry
//!
//! Compiles a [`ContractConfig`] once and serves lookups by
//! `(resource, route kind, part)`. The registry is immutable after
//! construction and can be shared across threads.

use std::path::Path;

use serde_json::Value;

use crate::audit::{audit_closed_shapes, OpenShapeFinding};
use crate::config::ContractConfig;
use crate::file_data::FileDataProfile;
use crate::resource::{ResourceSchemas, RouteKind, RoutePart, RouteSchemas};
use crate::shape::Shape;
use crate::validate::{CompiledSchema, Contract, SchemaValidationError};

/// Name of the upload middleware metadata contract.
pub const FILE_DATA_CONTRACT: &str = "file_data";

/// One row of [`ContractRegistry::route_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub resource: String,
    pub kind: RouteKind,
    pub method: &'static str,
    /// Mount point plus route path, e.g. `/uploads/info/:id`.
    pub path: String,
    pub parts: Vec<RoutePart>,
}

/// Every compiled contract of a deployment.
#[derive(Debug)]
pub struct ContractRegistry {
    profile: FileDataProfile,
    file_data: CompiledSchema,
    resources: Vec<ResourceSchemas>,
}

impl ContractRegistry {
    /// Check and compile `config`.
    ///
    /// # Errors
    ///
    /// [`SchemaValidationError::ConfigInvalid`] for an inconsistent
    /// configuration, [`SchemaValidationError::ValidatorBuildError`] if a
    /// contract fails to compile.
    pub fn new(config: &ContractConfig) -> Result<Self, SchemaValidationError> {
        config.validate()?;

        let file_data = CompiledSchema::compile(
            FILE_DATA_CONTRACT,
            Shape::object(config.file_data.shape()),
        )?;

        let mut resources = Vec::with_capacity(config.resources.len());
        for spec in &config.resources {
            let built = spec.build(config.file_data)?;
            tracing::debug!(
                resource = %spec.name,
                routes = built.routes().len(),
                "compiled resource contracts"
            );
            resources.push(built);
        }

        let registry = Self {
            profile: config.file_data,
            file_data,
            resources,
        };
        tracing::info!(
            resources = registry.resources.len(),
            contracts = registry.contracts().len(),
            file_data = config.file_data.as_str(),
            "contract registry ready"
        );
        Ok(registry)
    }

    /// Registry of the built-in deployment.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn builtin() -> Result<Self, SchemaValidationError> {
        Self::new(&ContractConfig::builtin())
    }

    /// Load a configuration file and compile it.
    ///
    /// # Errors
    ///
    /// See [`ContractConfig::from_path`] and [`new`](Self::new).
    pub fn from_config_path(path: &Path) -> Result<Self, SchemaValidationError> {
        Self::new(&ContractConfig::from_path(path)?)
    }

    /// The file metadata profile of this deployment.
    pub fn file_data_profile(&self) -> FileDataProfile {
        self.profile
    }

    /// The upload middleware metadata contract.
    pub fn file_data(&self) -> &CompiledSchema {
        &self.file_data
    }

    pub fn resources(&self) -> &[ResourceSchemas] {
        &self.resources
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceSchemas> {
        self.resources.iter().find(|r| r.name() == name)
    }

    pub fn route(&self, resource: &str, kind: RouteKind) -> Option<&RouteSchemas> {
        self.resource(resource)?.route(kind)
    }

    pub fn contract(&self, resource: &str, kind: RouteKind, part: RoutePart) -> Option<&dyn Contract> {
        self.route(resource, kind)?.part(part)
    }

    /// Validate `instance` against one route part.
    ///
    /// # Errors
    ///
    /// [`SchemaValidationError::UnknownContract`] when the route does not
    /// exist or declares no contract for `part`; otherwise as for
    /// [`Contract::validate`].
    pub fn validate(
        &self,
        resource: &str,
        kind: RouteKind,
        part: RoutePart,
        instance: &Value,
    ) -> Result<Value, SchemaValidationError> {
        let contract = self.contract(resource, kind, part).ok_or_else(|| {
            SchemaValidationError::UnknownContract {
                resource: resource.to_string(),
                route: kind.to_string(),
                part: part.to_string(),
            }
        })?;
        contract.validate(instance)
    }

    /// Every compiled contract: file metadata first, then per resource the
    /// entity, draft, update and route parts.
    pub fn contracts(&self) -> Vec<&dyn Contract> {
        let mut all: Vec<&dyn Contract> = Vec::new();
        all.push(&self.file_data);
        for resource in &self.resources {
            all.push(resource.entity());
            all.push(resource.draft());
            all.push(resource.update());
            for route in resource.routes() {
                all.extend(RoutePart::ALL.into_iter().filter_map(|p| route.part(p)));
            }
        }
        all
    }

    /// All routes with their full paths.
    pub fn route_table(&self) -> Vec<RouteEntry> {
        self.resources
            .iter()
            .flat_map(|resource| {
                resource.routes().iter().map(move |route| RouteEntry {
                    resource: resource.name().to_string(),
                    kind: route.kind(),
                    method: route.method(),
                    path: mount(resource.name(), route.path()),
                    parts: route.parts(),
                })
            })
            .collect()
    }

    /// Closed-shape audit over every contract, tagged with contract names.
    pub fn audit(&self) -> Vec<(String, OpenShapeFinding)> {
        self.contracts()
            .into_iter()
            .flat_map(|contract| {
                let name = contract.name().to_string();
                audit_closed_shapes(&contract.json_schema())
                    .into_iter()
                    .map(move |finding| (name.clone(), finding))
            })
            .collect()
    }
}

fn mount(resource: &str, path: &str) -> String {
    match path.trim_end_matches('/') {
        "" => format!("/{resource}"),
        rest => format!("/{resource}{rest}"),
    }
}

/// Parse a JSON or YAML document.
///
/// # Errors
///
/// [`SchemaValidationError::DocumentLoadError`] naming `origin` when the
/// text is neither.
pub fn parse_document(text: &str, origin: &str) -> Result<Value, SchemaValidationError> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }
    serde_yaml::from_str(text).map_err(|e| SchemaValidationError::DocumentLoadError {
        path: origin.to_string(),
        reason: e.to_string(),
    })
}

/// Read and parse a JSON or YAML document from disk.
///
/// # Errors
///
/// [`SchemaValidationError::DocumentLoadError`] when the file cannot be
/// read or parsed.
pub fn load_document(path: &Path) -> Result<Value, SchemaValidationError> {
    let origin = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| SchemaValidationError::DocumentLoadError {
        path: origin.clone(),
        reason: e.to_string(),
    })?;
    parse_document(&text, &origin)
}
