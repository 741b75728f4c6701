//! Resolution entry point: assembly followed by backtracking.

use crate::activate::{Activator, DEFAULT_MAX_DEPTH};
use crate::backtrack::{backtrack, Backtracked};
use crate::conflict::ConflictReport;
use crate::error::ResolveError;
use crate::graph::{ActivatedGraph, Occurrence};
use crate::registry::{Registry, Requirement};
use crate::version::Version;

/// Name of the synthetic root used when no project occurrence is given.
pub const ROOT_NAME: &str = "(root)";

/// Knobs for a resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Fail when a winning version violates any requirement naming it.
    pub strict: bool,
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// The output of a resolution run, with the intermediate graph kept for
/// tree views and diagnostics.
#[derive(Debug)]
pub struct Resolution {
    pub activated: ActivatedGraph,
    pub backtracked: Backtracked,
    pub conflicts: ConflictReport,
}

pub struct Resolver<'r> {
    registry: &'r dyn Registry,
    options: ResolveOptions,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r dyn Registry) -> Self {
        Self {
            registry,
            options: ResolveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ResolveOptions {
        self.options
    }

    /// Resolve `requirements` to one version per package name.
    pub fn resolve(&self, requirements: &[Requirement]) -> Result<Backtracked, ResolveError> {
        let root = Occurrence::root(ROOT_NAME, Version::new(0, 0, 0));
        self.resolve_detailed(root, requirements)
            .map(|resolution| resolution.backtracked)
    }

    /// Resolve the requirements of the project `name@version`.
    pub fn resolve_package(
        &self,
        name: &str,
        version: &str,
        requirements: &[Requirement],
    ) -> Result<Resolution, ResolveError> {
        let parsed = Version::parse(version).map_err(|source| ResolveError::InvalidVersion {
            name: name.to_string(),
            version: version.to_string(),
            source,
        })?;
        self.resolve_detailed(Occurrence::root(name, parsed), requirements)
    }

    /// Resolve `requirements` of `root`, keeping the activated graph and
    /// conflict report.
    pub fn resolve_detailed(
        &self,
        root: Occurrence,
        requirements: &[Requirement],
    ) -> Result<Resolution, ResolveError> {
        tracing::debug!(
            "Resolving {} requirement(s) of {root} against {}",
            requirements.len(),
            self.registry.id()
        );

        let activated = Activator::new(self.registry)
            .max_depth(self.options.max_depth)
            .activate(root, requirements)?;
        let (backtracked, conflicts) = backtrack(&activated);

        if self.options.strict {
            validate(&activated, &backtracked)?;
        }

        for conflict in &conflicts.conflicts {
            tracing::debug!("Conflict: {conflict}");
        }
        tracing::info!(
            "Resolved {} package(s) ({} conflict(s) collapsed)",
            backtracked.len(),
            conflicts.len()
        );

        Ok(Resolution {
            activated,
            backtracked,
            conflicts,
        })
    }
}

/// Resolve `requirements` against `registry` with default options.
pub fn resolve(
    registry: &dyn Registry,
    requirements: &[Requirement],
) -> Result<Backtracked, ResolveError> {
    Resolver::new(registry).resolve(requirements)
}

/// Check that every requirement edge is satisfied by its name's winner.
fn validate(activated: &ActivatedGraph, backtracked: &Backtracked) -> Result<(), ResolveError> {
    for (name, resolved) in backtracked {
        let mut violated = Vec::new();
        for idx in activated.occurrences() {
            if activated.node(idx).name != *name {
                continue;
            }
            for (parent, edge) in activated.dependents_of(idx) {
                if !edge.constraint.matches(&resolved.version) {
                    violated.push(format!(
                        "{} requires `{}`",
                        activated.node(parent),
                        edge.text
                    ));
                }
            }
        }
        if !violated.is_empty() {
            return Err(ResolveError::ConflictingRequirements {
                name: name.clone(),
                chosen: resolved.version.clone(),
                violated,
            });
        }
    }
    Ok(())
}
