//! # bucket-core: Foundational Types for the Bucket Contracts
//!
//! Leaf crate of the workspace. Defines the domain primitives that the
//! contract layer validates and the typed models deserialize into.
//!
//! ## Key Design Principles
//!
//! 1. **Validated newtypes.** `ResourceId`, `ResourceUrl` and `Timestamp`
//!    can only be constructed from values that pass their format checks.
//!
//! 2. **Text is preserved.** `ResourceUrl` and `Timestamp` keep the exact
//!    string they were built from, so a record parsed into a typed model
//!    serializes back to the same JSON.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `bucket-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod temporal;

pub use error::ValidationError;
pub use identity::{is_absolute_url, ResourceId, ResourceUrl};
pub use temporal::Timestamp;
