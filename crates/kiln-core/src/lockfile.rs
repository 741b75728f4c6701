use serde::{Deserialize, Serialize};
use std::path::Path;

use kiln_util::errors::KilnError;

const HEADER: &str = "# This file is generated by kiln. Do not edit it by hand.\n";

/// Deterministic lock file recording the exact resolved version of every package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    /// Fingerprint of the manifest this lock file was resolved from.
    #[serde(default, rename = "manifest-hash", skip_serializing_if = "Option::is_none")]
    pub manifest_hash: Option<String>,
    #[serde(default)]
    pub package: Vec<LockedPackage>,
}

/// A single locked package with its resolved version and origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,
    pub source: String,
}

impl Lockfile {
    /// Build a lock file from resolved packages, sorted by name.
    pub fn generate(manifest_hash: Option<String>, mut packages: Vec<LockedPackage>) -> Self {
        packages.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.version.cmp(&b.version)));
        Self {
            manifest_hash,
            package: packages,
        }
    }

    /// Load and parse a `Kiln.lock` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| KilnError::Lockfile {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            KilnError::Lockfile {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Serialize the lock file to a pretty-printed TOML string.
    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self).map(|body| format!("{HEADER}\n{body}"))
    }

    /// Atomically write the lock file to `path`.
    pub fn write_to(&self, path: &Path) -> miette::Result<()> {
        let content = self.to_string_pretty().map_err(|e| KilnError::Lockfile {
            message: format!("Failed to serialize lock file: {e}"),
        })?;
        kiln_util::fs::write_atomic(path, &content).map_err(KilnError::Io)?;
        Ok(())
    }

    /// Locked entry for a package name.
    pub fn find(&self, name: &str) -> Option<&LockedPackage> {
        self.package.iter().find(|p| p.name == name)
    }

    /// Whether this lock file was produced from a manifest with `hash`.
    pub fn is_fresh(&self, hash: &str) -> bool {
        self.manifest_hash.as_deref() == Some(hash)
    }
}
