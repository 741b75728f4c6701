//! The activated dependency graph: an arena of package occurrences.
//!
//! Nodes live in a `petgraph` arena and refer to each other only by index.
//! A node is unique per `(name, version)`; the same name may appear several
//! times at different versions, which is what backtracking collapses.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::interval::Constraint;
use crate::version::Version;

/// One package occurrence in the activated graph.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Occurrence {
    pub name: String,
    pub version: Version,
    /// Registry identifier the version was selected from.
    pub source: String,
}

impl Occurrence {
    /// The project being resolved.
    pub fn root(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            source: String::new(),
        }
    }

    /// `name@version` identifier.
    pub fn key(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// Edge label: the requirement through which the child was selected.
#[derive(Debug, Clone)]
pub struct DepEdge {
    pub constraint: Constraint,
    /// The constraint exactly as declared.
    pub text: String,
    /// Declaration position within the parent, used to keep structural order.
    pub position: usize,
}

/// A dependency edge that was not followed because it closed a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub from: String,
    pub to: String,
}

/// The `Activated` graph produced by dependency graph assembly.
#[derive(Debug, Default)]
pub struct ActivatedGraph {
    graph: DiGraph<Occurrence, DepEdge>,
    /// Lookup from `(name, version)` to node index.
    index: HashMap<(String, Version), NodeIndex>,
    pub root: Option<NodeIndex>,
    pub cycles: Vec<Cycle>,
}

impl ActivatedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or retrieve a node. If `(name, version)` already exists, returns the existing index.
    pub fn add_node(&mut self, node: Occurrence) -> NodeIndex {
        let key = (node.name.clone(), node.version.clone());
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        idx
    }

    /// Set the root node of the graph (the project itself).
    pub fn set_root(&mut self, idx: NodeIndex) {
        self.root = Some(idx);
    }

    /// Add a dependency edge from `from` to `to`.
    ///
    /// Every declared requirement gets its own edge, even when two of them
    /// select the same node.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: DepEdge) {
        self.graph.add_edge(from, to, edge);
    }

    /// Look up a node by name and version, ignoring build metadata.
    pub fn find(&self, name: &str, version: &Version) -> Option<NodeIndex> {
        self.index.get(&(name.to_string(), version.clone())).copied()
    }

    /// Get the node data for an index.
    pub fn node(&self, idx: NodeIndex) -> &Occurrence {
        &self.graph[idx]
    }

    /// Direct dependencies of a node, in declaration order.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DepEdge)> {
        let mut deps: Vec<(NodeIndex, &DepEdge)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        deps.sort_by_key(|(_, edge)| edge.position);
        deps
    }

    /// Reverse dependencies (who depends on this node).
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DepEdge)> {
        let mut deps: Vec<(NodeIndex, &DepEdge)> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), e.weight()))
            .collect();
        deps.sort_by_key(|(src, edge)| (src.index(), edge.position));
        deps
    }

    /// Non-root nodes in depth-first, root-to-leaves order as declared.
    pub fn occurrences(&self) -> Vec<NodeIndex> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        let mut order = Vec::new();
        let mut seen = HashSet::from([root]);
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            if idx != root {
                order.push(idx);
            }
            // Reverse so the first declared dependency is popped first.
            for (child, _) in self.dependencies_of(idx).into_iter().rev() {
                if seen.insert(child) {
                    stack.push(child);
                }
            }
        }
        order
    }

    /// Distinct versions seen for every name that occurs at more than one version.
    pub fn duplicates(&self) -> BTreeMap<&str, Vec<&Version>> {
        let mut by_name: BTreeMap<&str, Vec<&Version>> = BTreeMap::new();
        for idx in self.graph.node_indices() {
            if Some(idx) == self.root {
                continue;
            }
            let node = &self.graph[idx];
            by_name.entry(node.name.as_str()).or_default().push(&node.version);
        }
        by_name.retain(|_, versions| versions.len() > 1);
        for versions in by_name.values_mut() {
            versions.sort();
        }
        by_name
    }

    /// Print the dependency tree to a string.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let root = match self.root {
            Some(r) => r,
            None => return output,
        };

        output.push_str(&format!("{}\n", self.graph[root]));

        let mut visited = HashSet::new();
        visited.insert(root);

        let deps = self.dependencies_of(root);
        let count = deps.len();
        for (i, (idx, edge)) in deps.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(&mut output, *idx, edge, "", is_last, 1, max_depth, &mut visited);
        }

        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        edge: &DepEdge,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node} ({})\n", edge.text));

        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, (child, child_edge)) in deps.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(
                output,
                *child,
                child_edge,
                &child_prefix,
                is_last,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Find the path from root to the first occurrence of a package.
    ///
    /// Accepts either `name@version` or just `name`.
    pub fn find_path(&self, target_key: &str) -> Option<Vec<&Occurrence>> {
        let root = self.root?;
        let target = self.resolve_key(target_key)?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(root, target, &mut path, &mut visited) {
            Some(path.iter().map(|&idx| &self.graph[idx]).collect())
        } else {
            None
        }
    }

    /// Resolve a user-provided key to a node index.
    ///
    /// `name@version` selects that exact node; a bare name selects its lowest-indexed node.
    fn resolve_key(&self, key: &str) -> Option<NodeIndex> {
        if let Some((name, version)) = key.split_once('@') {
            return Version::parse(version).ok().and_then(|v| self.find(name, &v));
        }
        self.graph
            .node_indices()
            .filter(|&idx| Some(idx) != self.root)
            .find(|&idx| self.graph[idx].name == key)
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for (child, _) in self.dependencies_of(current) {
            if self.dfs_path(child, target, path, visited) {
                return true;
            }
        }
        path.pop();
        visited.remove(&current);
        false
    }

    /// Build an inverted dependency tree (reverse edges) for a single package.
    ///
    /// Accepts either `name@version` or just `name`.
    pub fn print_inverted_tree(&self, target_key: &str) -> String {
        let mut output = String::new();
        let Some(idx) = self.resolve_key(target_key) else {
            return output;
        };

        output.push_str(&format!("{}\n", self.graph[idx]));

        let mut visited = HashSet::new();
        visited.insert(idx);

        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, _)) in dependents.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_inverted_subtree(&mut output, *dep_idx, "", is_last, &mut visited);
        }

        output
    }

    fn print_inverted_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, _)) in dependents.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_inverted_subtree(output, *dep_idx, &child_prefix, is_last, visited);
        }

        visited.remove(&idx);
    }

    /// Number of nodes (excluding root).
    pub fn len(&self) -> usize {
        let total = self.graph.node_count();
        if self.root.is_some() {
            total.saturating_sub(1)
        } else {
            total
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
