//! Formula manifests: the pinned description of one installable package.

pub mod checksum;
pub mod validator;

pub use checksum::{Checksum, ChecksumAlgorithm};
pub use validator::FormulaValidator;

use crate::core::{StagerError, StagerResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A named dependency artifact with its source and declared integrity hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub url: String,
    #[serde(default, alias = "sha256", skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl Resource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, checksum: Option<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            checksum,
        }
    }

    /// Parsed checksum, `None` when none is declared (or it is blank)
    pub fn declared_checksum(&self) -> StagerResult<Option<Checksum>> {
        match self.checksum.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|e| match e {
                StagerError::Manifest(msg) => {
                    StagerError::Manifest(format!("resource '{}': {}", self.name, msg))
                }
                other => other,
            }),
        }
    }
}

fn default_search_path_var() -> String {
    "PYTHONPATH".to_string()
}

/// Formula manifest (YAML)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    pub name: String,
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    /// Source of the main package
    pub url: String,

    /// Checksum of the main package source (optional, warned when absent)
    #[serde(default, alias = "sha256", skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,

    /// Interpreter override; falls back to the configured interpreter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,

    /// `X.Y` version used for `lib/pythonX.Y`; detected when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,

    #[serde(default = "default_search_path_var")]
    pub search_path_var: String,

    /// Staged dependencies, in declaration order
    #[serde(default)]
    pub resources: Vec<Resource>,

    /// Explicit subset and order of resources to install
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_order: Option<Vec<String>>,

    /// External directories appended to the search path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_paths: Vec<PathBuf>,

    /// Executables that must be available on PATH
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Smoke-test commands run against an installed keg
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test: Vec<String>,
}

impl Formula {
    /// Load and validate a formula file
    pub fn load(path: &Path) -> StagerResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StagerError::Manifest(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let formula = Self::parse(&content)?;
        FormulaValidator::validate(&formula)?;
        Ok(formula)
    }

    /// Parse without validating
    pub fn parse(content: &str) -> StagerResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| StagerError::Manifest(format!("Failed to parse formula: {}", e)))
    }

    /// The main package as a resource named after the formula
    pub fn main_resource(&self) -> Resource {
        Resource::new(self.name.clone(), self.url.clone(), self.checksum.clone())
    }

    /// Resources to install, in install order.
    ///
    /// Without `install_order` this is declaration order. Names in
    /// `install_order` must exist; validation guarantees that.
    pub fn ordered_resources(&self) -> StagerResult<Vec<&Resource>> {
        match &self.install_order {
            None => Ok(self.resources.iter().collect()),
            Some(order) => order
                .iter()
                .map(|name| {
                    self.resource(name).ok_or_else(|| {
                        StagerError::Manifest(format!(
                            "install_order names unknown resource '{}'",
                            name
                        ))
                    })
                })
                .collect(),
        }
    }

    /// Declared resources left out of `install_order`
    pub fn skipped_resources(&self) -> Vec<&Resource> {
        match &self.install_order {
            None => Vec::new(),
            Some(order) => self
                .resources
                .iter()
                .filter(|r| !order.contains(&r.name))
                .collect(),
        }
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }
}
