//! Dependency graph assembly.
//!
//! Expands the root requirements depth-first in declaration order, picking
//! the highest published version that satisfies each local constraint.

use petgraph::graph::NodeIndex;

use crate::cache::{IndexCache, VisitedSet};
use crate::error::ResolveError;
use crate::graph::{ActivatedGraph, Cycle, DepEdge, Occurrence};
use crate::interval::Constraint;
use crate::registry::{Registry, RegistryEntry, Requirement};
use crate::version::Version;

/// Default limit on the length of a dependency chain.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Builds an [`ActivatedGraph`] by querying a registry.
pub struct Activator<'r> {
    registry: &'r dyn Registry,
    max_depth: usize,
    cache: IndexCache,
    visited: VisitedSet,
    graph: ActivatedGraph,
}

impl<'r> Activator<'r> {
    pub fn new(registry: &'r dyn Registry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
            cache: IndexCache::new(),
            visited: VisitedSet::new(),
            graph: ActivatedGraph::new(),
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expand `requirements` of `root` into the activated graph.
    pub fn activate(
        mut self,
        root: Occurrence,
        requirements: &[Requirement],
    ) -> Result<ActivatedGraph, ResolveError> {
        let (name, version) = (root.name.clone(), root.version.clone());
        let root_idx = self.graph.add_node(root);
        self.graph.set_root(root_idx);
        self.visited.enter(&name, &version, root_idx);

        self.expand(root_idx, requirements, 1)?;
        self.visited.leave(&name, &version);

        tracing::debug!(
            "Activated {} occurrence(s) with {} registry lookup(s)",
            self.graph.len(),
            self.cache.lookups()
        );
        Ok(self.graph)
    }

    fn expand(
        &mut self,
        parent: NodeIndex,
        requirements: &[Requirement],
        depth: usize,
    ) -> Result<(), ResolveError> {
        for (position, req) in requirements.iter().enumerate() {
            let constraint =
                Constraint::parse(&req.constraint).map_err(|source| ResolveError::InvalidConstraint {
                    name: req.name.clone(),
                    source,
                })?;

            let entry = self.select(parent, req, &constraint)?;
            let version = entry.version.clone();
            let edge = DepEdge {
                constraint,
                text: req.constraint.clone(),
                position,
            };

            if self.visited.on_stack(&req.name, &version) {
                let from = self.graph.node(parent).key();
                let to = format!("{}@{version}", req.name);
                tracing::warn!("Dependency cycle {from} -> {to}, edge not followed");
                self.graph.cycles.push(Cycle { from, to });
                continue;
            }

            if let Some(existing) = self.visited.expanded(&req.name, &version) {
                tracing::debug!("Reusing {}@{version}", req.name);
                self.graph.add_edge(parent, existing, edge);
                continue;
            }

            if depth > self.max_depth {
                return Err(ResolveError::DepthExceeded {
                    name: req.name.clone(),
                    max_depth: self.max_depth,
                });
            }

            let idx = self.graph.add_node(Occurrence {
                name: req.name.clone(),
                version: version.clone(),
                source: entry.source.clone(),
            });
            self.graph.add_edge(parent, idx, edge);
            self.visited.enter(&req.name, &version, idx);
            self.expand(idx, &entry.dependencies, depth + 1)?;
            self.visited.leave(&req.name, &version);
        }
        Ok(())
    }

    /// The highest published version of `req.name` matching `constraint`.
    fn select(
        &mut self,
        parent: NodeIndex,
        req: &Requirement,
        constraint: &Constraint,
    ) -> Result<RegistryEntry, ResolveError> {
        let entries = self
            .cache
            .lookup(self.registry, &req.name)
            .map_err(|source| ResolveError::Registry {
                name: req.name.clone(),
                source,
            })?;

        if let Some(entry) = entries
            .iter()
            .filter(|e| constraint.matches(&e.version))
            .max_by(|a, b| a.version.cmp(&b.version))
        {
            tracing::debug!("Selected {}@{} for `{}`", req.name, entry.version, req.constraint);
            return Ok(entry.clone());
        }

        let mut considered: Vec<Version> = entries.iter().map(|e| e.version.clone()).collect();
        considered.sort_by(|a, b| b.cmp(a));
        considered.dedup();
        let advice = rejection_advice(&req.name, &req.constraint, constraint, &considered);
        Err(ResolveError::Unresolvable {
            name: req.name.clone(),
            constraint: req.constraint.clone(),
            registry: self.registry.id().to_string(),
            required_by: self.graph.node(parent).to_string(),
            considered,
            advice,
        })
    }
}

fn rejection_advice(name: &str, text: &str, constraint: &Constraint, considered: &[Version]) -> String {
    if considered.is_empty() {
        return format!("`{name}` has no published versions; check the package name");
    }
    let reasons: Vec<String> = considered
        .iter()
        .map(|v| {
            if v.is_prerelease() && constraint.matches(&v.release()) {
                format!("{v} (pre-release, not requested)")
            } else {
                format!("{v} (outside `{text}`)")
            }
        })
        .collect();
    format!("considered {}", reasons.join(", "))
}
