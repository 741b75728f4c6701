//! The registry capability: published versions of a package and their
//! declared dependencies.
//!
//! The resolver never reaches for ambient state; a [`Registry`] is handed to it
//! explicitly. [`MemoryRegistry`] backs tests and embedders, [`LocalRegistry`]
//! reads a directory of TOML index files.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::version::{Version, VersionParseError};

/// A named dependency with an unparsed constraint, as declared in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    pub name: String,
    pub constraint: String,
}

impl Requirement {
    pub fn new(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: constraint.into(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.constraint)
    }
}

/// One published version of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub version: Version,
    /// Identifier of the registry that published this version.
    pub source: String,
    pub dependencies: Vec<Requirement>,
}

/// An opaque failure from a registry backend, passed through unchanged.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct RegistryError {
    pub message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RegistryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Source of truth mapping a package name to its published versions.
///
/// Implementations are read-only from the resolver's point of view and may be
/// shared between independent resolution runs.
pub trait Registry: Send + Sync {
    /// Identifier recorded as the `source` of packages resolved from here.
    fn id(&self) -> &str;

    /// All published versions of `name`, in no particular order.
    ///
    /// An unknown package yields an empty list, not an error.
    fn list_versions(&self, name: &str) -> Result<Vec<RegistryEntry>, RegistryError>;
}

/// An in-memory registry.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    id: String,
    packages: BTreeMap<String, Vec<RegistryEntry>>,
}

impl MemoryRegistry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            packages: BTreeMap::new(),
        }
    }

    /// Publish `name@version` declaring `dependencies` as `(name, constraint)` pairs.
    pub fn publish(
        &mut self,
        name: &str,
        version: &str,
        dependencies: &[(&str, &str)],
    ) -> Result<&mut Self, VersionParseError> {
        let entry = RegistryEntry {
            version: Version::parse(version)?,
            source: self.id.clone(),
            dependencies: dependencies
                .iter()
                .map(|(dep, constraint)| Requirement::new(*dep, *constraint))
                .collect(),
        };
        self.packages.entry(name.to_string()).or_default().push(entry);
        Ok(self)
    }
}

impl Registry for MemoryRegistry {
    fn id(&self) -> &str {
        &self.id
    }

    fn list_versions(&self, name: &str) -> Result<Vec<RegistryEntry>, RegistryError> {
        Ok(self.packages.get(name).cloned().unwrap_or_default())
    }
}

/// On-disk index file for one package: `<root>/<name>.toml`.
#[derive(Debug, Deserialize)]
struct IndexFile {
    #[serde(default)]
    versions: Vec<IndexVersion>,
}

#[derive(Debug, Deserialize)]
struct IndexVersion {
    version: Version,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    yanked: bool,
}

/// A registry backed by a local directory of per-package TOML index files.
///
/// ```toml
/// [[versions]]
/// version = "1.0.0"
/// [versions.dependencies]
/// fmt = "^9.1"
/// ```
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    id: String,
    root: PathBuf,
}

impl LocalRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            id: format!("local+{}", root.display()),
            root,
        }
    }

    /// Override the identifier recorded as the package source.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self, name: &str) -> Result<PathBuf, RegistryError> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(RegistryError::new(format!(
                "invalid package name `{name}` for registry {}",
                self.id
            )));
        }
        Ok(self.root.join(format!("{name}.toml")))
    }
}

impl Registry for LocalRegistry {
    fn id(&self) -> &str {
        &self.id
    }

    fn list_versions(&self, name: &str) -> Result<Vec<RegistryEntry>, RegistryError> {
        let path = self.index_path(name)?;
        if !path.is_file() {
            tracing::debug!("No index file for {name} at {}", path.display());
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| {
            RegistryError::with_source(format!("failed to read {}", path.display()), e)
        })?;
        let index: IndexFile = toml::from_str(&content).map_err(|e| {
            RegistryError::with_source(format!("failed to parse {}", path.display()), e)
        })?;

        Ok(index
            .versions
            .into_iter()
            .filter(|v| !v.yanked)
            .map(|v| RegistryEntry {
                version: v.version,
                source: self.id.clone(),
                dependencies: v
                    .dependencies
                    .into_iter()
                    .map(|(dep, constraint)| Requirement::new(dep, constraint))
                    .collect(),
            })
            .collect())
    }
}
