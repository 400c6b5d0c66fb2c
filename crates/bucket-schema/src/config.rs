//! # Deployment Configuration
//!
//! A deployment is the file metadata profile plus the list of resources it
//! serves. Field-level drift between deployments (an optional URL, an extra
//! linking key) is an edit to this document, not to code.
//!
//! ```yaml
//! file_data: multer
//! resources:
//!   - name: videos
//!     generated: [id]
//!     entity:
//!       - { name: id, shape: { type: number, minimum: 1 } }
//!       - { name: name, shape: { type: non_blank } }
//!       - { name: original_video_url, shape: { type: url }, optional: true }
//!     routes:
//!       - { kind: get, path: "/:id" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::builtin_resources;
use crate::file_data::FileDataProfile;
use crate::resource::ResourceSpec;
use crate::validate::SchemaValidationError;

/// Everything needed to build a [`ContractRegistry`](crate::ContractRegistry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractConfig {
    /// Metadata record produced by the upload middleware.
    #[serde(default)]
    pub file_data: FileDataProfile,
    /// Served resources.
    pub resources: Vec<ResourceSpec>,
}

impl ContractConfig {
    /// The default deployment: thumbnails, torrents, uploads and videos
    /// with the compact file metadata profile.
    pub fn builtin() -> Self {
        Self {
            file_data: FileDataProfile::Compact,
            resources: builtin_resources(),
        }
    }

    /// Parse a YAML document and check it.
    ///
    /// # Errors
    ///
    /// [`SchemaValidationError::ConfigLoadError`] on malformed YAML,
    /// [`SchemaValidationError::ConfigInvalid`] on an inconsistent document.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaValidationError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| SchemaValidationError::ConfigLoadError {
                path: "<inline>".to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file. `.json` files are parsed as JSON,
    /// anything else as YAML.
    ///
    /// # Errors
    ///
    /// [`SchemaValidationError::ConfigLoadError`] when the file cannot be
    /// read or parsed, [`SchemaValidationError::ConfigInvalid`] when it is
    /// inconsistent.
    pub fn from_path(path: &Path) -> Result<Self, SchemaValidationError> {
        let load_error = |reason: String| SchemaValidationError::ConfigLoadError {
            path: path.display().to_string(),
            reason,
        };

        let text = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let config: Self = if is_json {
            serde_json::from_str(&text).map_err(|e| load_error(e.to_string()))?
        } else {
            serde_yaml::from_str(&text).map_err(|e| load_error(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the whole deployment for consistency.
    ///
    /// # Errors
    ///
    /// [`SchemaValidationError::ConfigInvalid`] listing every problem.
    pub fn validate(&self) -> Result<(), SchemaValidationError> {
        let mut problems = Vec::new();

        let mut names: Vec<&str> = Vec::new();
        for resource in &self.resources {
            if names.contains(&resource.name.as_str()) {
                problems.push(format!("resource \"{}\" declared twice", resource.name));
            }
            names.push(&resource.name);
            problems.extend(resource.problems(self.file_data));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ConfigInvalid {
                reason: problems.join("; "),
            })
        }
    }

    /// Look up a resource declaration by name.
    pub fn resource(&self, name: &str) -> Option<&ResourceSpec> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Mutable lookup, for deriving a deployment from [`builtin`](Self::builtin).
    pub fn resource_mut(&mut self, name: &str) -> Option<&mut ResourceSpec> {
        self.resources.iter_mut().find(|r| r.name == name)
    }
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self::builtin()
    }
}
