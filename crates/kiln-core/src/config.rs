use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use kiln_util::errors::KilnError;

/// Global user configuration loaded from `~/.kiln/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Default registry from `[registry]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path of the local index directory used when a project names none.
    #[serde(default)]
    pub index: Option<String>,
}

/// Resolver settings from `[resolver]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Reject a winning version that violates any requirement on it.
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_max_depth", rename = "max-depth")]
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strict: false,
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    64
}

impl GlobalConfig {
    /// Load the global configuration from `~/.kiln/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load from an explicit path, returning defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            tracing::debug!("No global config at {}", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| KilnError::Generic {
            message: format!("Failed to read global config: {e}"),
        })?;
        toml::from_str(&content).map_err(|e| {
            KilnError::Generic {
                message: format!("Failed to parse global config {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Returns the path to the Kiln data directory (`~/.kiln/`), honouring `KILN_HOME`.
pub fn dirs_path() -> PathBuf {
    if let Ok(home) = std::env::var("KILN_HOME") {
        return PathBuf::from(home);
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".kiln")
}
