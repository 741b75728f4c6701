//! Per-run caches used while assembling the activated graph.
//!
//! Registry answers are memoised per package name, and every expanded
//! `(name, version)` pair is remembered together with its arena index so a
//! shared subtree is only expanded once.

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;

use crate::registry::{Registry, RegistryEntry, RegistryError};
use crate::version::Version;

/// Tracks which `(name, version)` pairs have been expanded, and which are on
/// the current recursion stack, to stop infinite loops in cyclic manifests.
#[derive(Debug, Default)]
pub struct VisitedSet {
    expanded: HashMap<(String, Version), NodeIndex>,
    stack: HashSet<(String, Version)>,
}

/// Build metadata does not take part, matching `Version` equality.
fn key(name: &str, version: &Version) -> (String, Version) {
    (name.to_string(), version.clone())
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena index of an already expanded `(name, version)`.
    pub fn expanded(&self, name: &str, version: &Version) -> Option<NodeIndex> {
        self.expanded.get(&key(name, version)).copied()
    }

    /// Whether `(name, version)` is being expanded further up the stack.
    pub fn on_stack(&self, name: &str, version: &Version) -> bool {
        self.stack.contains(&key(name, version))
    }

    /// Record `(name, version)` at `idx` and push it on the stack.
    /// Returns `false` if it was already expanded.
    pub fn enter(&mut self, name: &str, version: &Version, idx: NodeIndex) -> bool {
        let k = key(name, version);
        if self.expanded.contains_key(&k) {
            return false;
        }
        self.expanded.insert(k.clone(), idx);
        self.stack.insert(k);
        true
    }

    /// Pop `(name, version)` off the recursion stack.
    pub fn leave(&mut self, name: &str, version: &Version) {
        self.stack.remove(&key(name, version));
    }
}

/// Memoised registry answers for the duration of one resolution run.
#[derive(Debug, Default)]
pub struct IndexCache {
    entries: HashMap<String, Vec<RegistryEntry>>,
    lookups: usize,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// All published versions of `name`, asking the registry at most once.
    pub fn lookup(
        &mut self,
        registry: &dyn Registry,
        name: &str,
    ) -> Result<&[RegistryEntry], RegistryError> {
        if !self.entries.contains_key(name) {
            let versions = registry.list_versions(name)?;
            tracing::debug!(
                "Registry {} lists {} version(s) of {name}",
                registry.id(),
                versions.len()
            );
            self.lookups += 1;
            self.entries.insert(name.to_string(), versions);
        }
        Ok(self
            .entries
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Number of registry queries issued so far.
    pub fn lookups(&self) -> usize {
        self.lookups
    }
}
