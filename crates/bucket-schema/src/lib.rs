//! # bucket-schema: Request/Response Contracts
//!
//! Describes, for each route of the bucket file-hosting service, the shape
//! of path parameters, query parameters, request bodies and response
//! envelopes, and validates untrusted values against them.
//!
//! ## Shapes (`shape`, `validate`)
//!
//! A [`Shape`] is a declared type. Object shapes are always closed: a key
//! that is not declared is a violation. Shapes are emitted as Draft 2020-12
//! JSON Schema and compiled with `jsonschema` into a [`CompiledSchema`].
//! Numbers marked `coerce` accept numeric strings (path and query
//! parameters) and are converted before bounds are checked.
//!
//! ## Envelopes (`envelope`)
//!
//! Every response is `{ok: true, data}` or `{ok: false, error}`.
//! [`EnvelopeSchema`] dispatches on the literal `ok` and validates only the
//! selected branch.
//!
//! ## Resources (`resource`, `catalog`, `config`, `registry`)
//!
//! One factory, [`ResourceSpec::build`], turns a field list and a route
//! table into every contract of a resource. [`ContractConfig`] holds the
//! deployment (built-in or loaded from YAML/JSON) and
//! [`ContractRegistry`] serves the compiled contracts by
//! `(resource, route, part)`.
//!
//! ## Crate Policy
//!
//! - Depends only on `bucket-core` internally.
//! - Validation never repairs a value. The only transformation is numeric
//!   coercion of fields declared `coerce`.
//! - Every violation is reported, not just the first.

pub mod audit;
pub mod catalog;
pub mod config;
pub mod envelope;
pub mod file_data;
pub mod models;
pub mod registry;
pub mod resource;
pub mod shape;
pub mod validate;

pub use audit::{audit_closed_shapes, OpenShapeFinding};
pub use config::ContractConfig;
pub use envelope::{envelope_schema, error_schema, success_schema, ApiResponse, EnvelopeSchema};
pub use file_data::{FileDataProfile, MulterFile, StoredFile};
pub use registry::{load_document, parse_document, ContractRegistry, RouteEntry};
pub use resource::{
    PaginationSource, ResourceSchemas, ResourceSpec, RouteKind, RoutePart, RouteSchemas,
    RouteSpec, UploadPayload,
};
pub use shape::{Field, ObjectShape, Shape};
pub use validate::{
    parse, CompiledSchema, Contract, SchemaValidationError, ValidationViolations, Violation,
    ViolationKind,
};
