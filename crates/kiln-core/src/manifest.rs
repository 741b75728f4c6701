use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use kiln_util::errors::KilnError;

use crate::dependency::Dependency;

/// The parsed representation of a `Kiln.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub package: PackageMetadata,

    #[serde(default)]
    pub dependencies: BTreeMap<String, Dependency>,

    #[serde(default, rename = "dev-dependencies")]
    pub dev_dependencies: BTreeMap<String, Dependency>,

    #[serde(default)]
    pub registry: Option<RegistrySection>,
}

/// Package identity and metadata from the `[package]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub license: Option<String>,
}

/// Per-project registry override from `[registry]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySection {
    /// Path of a local index directory, relative to the manifest.
    #[serde(default)]
    pub index: Option<String>,
}

impl Manifest {
    /// Load and parse a `Kiln.toml` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| KilnError::Manifest {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_str(&content)
    }

    /// Parse a `Kiln.toml` from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            KilnError::Manifest {
                message: format!("Failed to parse Kiln.toml: {e}"),
            }
            .into()
        })
    }

    /// Root requirements as `(package, constraint)` pairs, regular
    /// dependencies first, each table in key order.
    pub fn requirements(&self, include_dev: bool) -> Vec<(String, String)> {
        let dev = include_dev.then_some(&self.dev_dependencies);
        std::iter::once(&self.dependencies)
            .chain(dev)
            .flat_map(|table| table.iter())
            .map(|(key, dep)| (dep.package_name(key).to_string(), dep.constraint().to_string()))
            .collect()
    }

    /// Fingerprint of everything that influences resolution.
    ///
    /// Stored in the lock file so an unchanged manifest can skip resolving.
    pub fn resolution_hash(&self) -> String {
        let registry = self
            .registry
            .as_ref()
            .and_then(|r| r.index.as_deref())
            .unwrap_or("");
        let deps = self.requirements(false);
        let dev = self.requirements(true);
        let pairs = std::iter::once(("registry", registry))
            .chain(deps.iter().map(|(n, c)| (n.as_str(), c.as_str())))
            .chain(std::iter::once(("dev", "")))
            .chain(dev[deps.len()..].iter().map(|(n, c)| (n.as_str(), c.as_str())));
        kiln_util::hash::sha256_pairs(pairs)
    }
}
