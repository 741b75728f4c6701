use serde::{Deserialize, Serialize};

/// A dependency specification in Kiln.toml.
///
/// Supports both shorthand (`fmt = "^9.1"`) and detailed
/// (`fmt = { version = "^9.1" }`) forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    Short(String),
    Detailed(DetailedDependency),
}

/// A dependency written as a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedDependency {
    pub version: String,
    /// Registry package name, when it differs from the dependency key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

impl Dependency {
    /// The version constraint text, exactly as written.
    pub fn constraint(&self) -> &str {
        match self {
            Self::Short(constraint) => constraint,
            Self::Detailed(detailed) => &detailed.version,
        }
    }

    /// The registry package name for the dependency declared under `key`.
    pub fn package_name<'a>(&'a self, key: &'a str) -> &'a str {
        match self {
            Self::Detailed(DetailedDependency {
                package: Some(package),
                ..
            }) => package,
            _ => key,
        }
    }
}
