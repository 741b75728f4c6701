use miette::Diagnostic;
use thiserror::Error;

use crate::interval::ConstraintParseError;
use crate::registry::RegistryError;
use crate::version::{Version, VersionParseError};

/// Why a resolution run failed. No partial result accompanies any variant.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("invalid version `{version}` for `{name}`")]
    #[diagnostic(code(kiln::resolve::invalid_version))]
    InvalidVersion {
        name: String,
        version: String,
        #[source]
        #[diagnostic_source]
        source: VersionParseError,
    },

    #[error("invalid constraint for `{name}`")]
    #[diagnostic(code(kiln::resolve::invalid_constraint))]
    InvalidConstraint {
        name: String,
        #[source]
        #[diagnostic_source]
        source: ConstraintParseError,
    },

    #[error("no version of `{name}` in {registry} satisfies `{constraint}` (required by {required_by})")]
    #[diagnostic(code(kiln::resolve::unresolvable))]
    Unresolvable {
        name: String,
        constraint: String,
        registry: String,
        required_by: String,
        /// Every published version, highest first.
        considered: Vec<Version>,
        #[help]
        advice: String,
    },

    #[error("registry lookup for `{name}` failed")]
    #[diagnostic(code(kiln::resolve::registry))]
    Registry {
        name: String,
        #[source]
        source: RegistryError,
    },

    #[error("dependency chain through `{name}` is deeper than {max_depth} levels")]
    #[diagnostic(
        code(kiln::resolve::depth),
        help("raise `max-depth` in the [resolver] section of the kiln config")
    )]
    DepthExceeded { name: String, max_depth: usize },

    #[error("`{name}` resolved to {chosen}, which violates: {}", .violated.join("; "))]
    #[diagnostic(
        code(kiln::resolve::conflict),
        help("relax one of the requirements, or resolve without --strict to let the highest version win")
    )]
    ConflictingRequirements {
        name: String,
        chosen: Version,
        violated: Vec<String>,
    },
}

impl ResolveError {
    /// The package the failure is about.
    pub fn package(&self) -> &str {
        match self {
            Self::InvalidVersion { name, .. }
            | Self::InvalidConstraint { name, .. }
            | Self::Unresolvable { name, .. }
            | Self::Registry { name, .. }
            | Self::DepthExceeded { name, .. }
            | Self::ConflictingRequirements { name, .. } => name,
        }
    }
}
