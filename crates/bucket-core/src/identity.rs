//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the identifiers and locations that cross
//! the contract boundary.
//!
//! ## Validation
//!
//! - [`ResourceId`] is a database id as it appears in a path or query
//!   parameter: an integer `>= 1`.
//! - [`ResourceUrl`] is an absolute URL, checked with the WHATWG parser from
//!   the `url` crate. The original text is kept verbatim; `url::Url` would
//!   normalize `http://github.com` to `http://github.com/`.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identifier of a stored resource, as addressed by `/:id` routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ResourceId(u64);

impl ResourceId {
    /// Smallest id a route will accept.
    pub const MIN: u64 = 1;

    /// Create a resource identifier, rejecting `0`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ResourceIdOutOfRange`] when `value` is
    /// below [`ResourceId::MIN`].
    pub fn new(value: u64) -> Result<Self, ValidationError> {
        if value < Self::MIN {
            return Err(ValidationError::ResourceIdOutOfRange {
                value,
                minimum: Self::MIN,
            });
        }
        Ok(Self(value))
    }

    /// Access the numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for ResourceId {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceId> for u64 {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns `true` if `s` parses as an absolute URL.
///
/// Special schemes (`http`, `https`, `ftp`, `ws`, `wss`, `file`) require a
/// host, so `"http://"` is rejected.
pub fn is_absolute_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

/// An absolute URL pointing at a stored resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceUrl(String);

impl ResourceUrl {
    /// Create a resource URL, validating absolute-URL syntax.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUrl`] with the parser's reason.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if let Err(e) = url::Url::parse(&s) {
            return Err(ValidationError::InvalidUrl {
                value: s,
                reason: e.to_string(),
            });
        }
        Ok(Self(s))
    }

    /// Access the URL text exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ResourceUrl {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceUrl> for String {
    fn from(url: ResourceUrl) -> Self {
        url.0
    }
}

impl std::fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
