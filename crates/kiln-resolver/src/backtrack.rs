//! Backtracking: collapse the activated graph to one version per name.

use std::collections::btree_map::{self, Entry};
use std::collections::BTreeMap;
use std::fmt;

use crate::conflict::{ConflictReport, VersionConflict};
use crate::graph::ActivatedGraph;
use crate::registry::Requirement;
use crate::version::Version;

/// The final choice for one package name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub version: Version,
    pub source: String,
}

/// One consistent `(version, source)` per package name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Backtracked {
    packages: BTreeMap<String, ResolvedPackage>,
}

impl Backtracked {
    pub fn get(&self, name: &str) -> Option<&ResolvedPackage> {
        self.packages.get(name)
    }

    pub fn version(&self, name: &str) -> Option<&Version> {
        self.packages.get(name).map(|p| &p.version)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Packages in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ResolvedPackage> {
        self.packages.iter()
    }

    /// Every resolved package as an `=version` requirement.
    ///
    /// Resolving these against the same registry reproduces this map.
    pub fn pinned_requirements(&self) -> Vec<Requirement> {
        self.packages
            .iter()
            .map(|(name, pkg)| {
                Requirement::new(name.clone(), format!("={}", pkg.version.without_build()))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Backtracked {
    type Item = (&'a String, &'a ResolvedPackage);
    type IntoIter = btree_map::Iter<'a, String, ResolvedPackage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<(String, ResolvedPackage)> for Backtracked {
    fn from_iter<I: IntoIterator<Item = (String, ResolvedPackage)>>(iter: I) -> Self {
        Self {
            packages: iter.into_iter().collect(),
        }
    }
}

/// `name = "version"` lines.
impl fmt::Display for Backtracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, pkg) in &self.packages {
            writeln!(f, "{name} = \"{}\"", pkg.version)?;
        }
        Ok(())
    }
}

/// Merge every occurrence of each name into its highest version.
///
/// Occurrences are visited depth-first from the root; since the winner is a
/// per-name maximum the result does not depend on that order. Losing
/// occurrences are reported, not re-validated.
pub fn backtrack(graph: &ActivatedGraph) -> (Backtracked, ConflictReport) {
    let occurrences = graph.occurrences();
    let mut packages: BTreeMap<String, ResolvedPackage> = BTreeMap::new();

    for &idx in &occurrences {
        let occ = graph.node(idx);
        match packages.entry(occ.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(ResolvedPackage {
                    version: occ.version.clone(),
                    source: occ.source.clone(),
                });
            }
            Entry::Occupied(mut slot) => {
                if occ.version > slot.get().version {
                    tracing::debug!(
                        "Backtracking {} from {} to {}",
                        occ.name,
                        slot.get().version,
                        occ.version
                    );
                    slot.insert(ResolvedPackage {
                        version: occ.version.clone(),
                        source: occ.source.clone(),
                    });
                }
            }
        }
    }

    let mut report = ConflictReport::new();
    for &idx in &occurrences {
        let occ = graph.node(idx);
        let Some(winner) = packages.get(&occ.name) else {
            continue;
        };
        if winner.version == occ.version {
            continue;
        }
        for (parent, edge) in graph.dependents_of(idx) {
            report.add(VersionConflict {
                name: occ.name.clone(),
                requested: occ.version.clone(),
                resolved: winner.version.clone(),
                required_by: format!("{} ({})", graph.node(parent), edge.text),
                reason: "highest version wins".to_string(),
            });
        }
    }

    (Backtracked { packages }, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DepEdge, Occurrence};
    use crate::interval::Constraint;

    fn occ(name: &str, version: &str) -> Occurrence {
        Occurrence {
            name: name.to_string(),
            version: Version::parse(version).unwrap(),
            source: "mem".to_string(),
        }
    }

    fn pin(version: &str, position: usize) -> DepEdge {
        let text = format!("={version}");
        DepEdge {
            constraint: Constraint::parse(&text).unwrap(),
            text,
            position,
        }
    }

    /// Root requires D@1.0.0, D@1.1.0, E, A, B, C; B requires D@1.0.0, D@1.1.0, E;
    /// C requires D@1.1.0.
    fn highest_wins_graph() -> ActivatedGraph {
        let mut g = ActivatedGraph::new();
        let root = g.add_node(Occurrence::root("app", Version::new(0, 1, 0)));
        g.set_root(root);
        let d10 = g.add_node(occ("D", "1.0.0"));
        let d11 = g.add_node(occ("D", "1.1.0"));
        let e = g.add_node(occ("E", "1.0.0"));
        let a = g.add_node(occ("A", "1.0.0"));
        let b = g.add_node(occ("B", "1.0.0"));
        let c = g.add_node(occ("C", "1.0.0"));
        g.add_edge(root, d10, pin("1.0.0", 0));
        g.add_edge(root, d11, pin("1.1.0", 1));
        g.add_edge(root, e, pin("1.0.0", 2));
        g.add_edge(root, a, pin("1.0.0", 3));
        g.add_edge(root, b, pin("1.0.0", 4));
        g.add_edge(root, c, pin("1.0.0", 5));
        g.add_edge(b, d10, pin("1.0.0", 0));
        g.add_edge(b, d11, pin("1.1.0", 1));
        g.add_edge(b, e, pin("1.0.0", 2));
        g.add_edge(c, d11, pin("1.1.0", 0));
        g
    }

    #[test]
    fn highest_version_wins() {
        let (resolved, report) = backtrack(&highest_wins_graph());
        let flat: Vec<(&str, String)> = resolved
            .iter()
            .map(|(name, pkg)| (name.as_str(), pkg.version.to_string()))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("A", "1.0.0".to_string()),
                ("B", "1.0.0".to_string()),
                ("C", "1.0.0".to_string()),
                ("D", "1.1.0".to_string()),
                ("E", "1.0.0".to_string()),
            ]
        );
        // D@1.0.0 was required by the root and by B.
        assert_eq!(report.len(), 2);
        assert!(report
            .conflicts
            .iter()
            .all(|c| c.name == "D" && c.resolved == Version::new(1, 1, 0)));
    }

    #[test]
    fn agreeing_occurrences_are_not_conflicts() {
        let mut g = ActivatedGraph::new();
        let root = g.add_node(Occurrence::root("app", Version::new(0, 1, 0)));
        g.set_root(root);
        let a = g.add_node(occ("a", "1.0.0"));
        let b = g.add_node(occ("b", "1.0.0"));
        let shared = g.add_node(occ("shared", "2.0.0"));
        g.add_edge(root, a, pin("1.0.0", 0));
        g.add_edge(root, b, pin("1.0.0", 1));
        g.add_edge(a, shared, pin("2.0.0", 0));
        g.add_edge(b, shared, pin("2.0.0", 0));

        let (resolved, report) = backtrack(&g);
        assert_eq!(resolved.len(), 3);
        assert!(report.is_empty());
    }

    #[test]
    fn empty_graph() {
        let (resolved, report) = backtrack(&ActivatedGraph::new());
        assert!(resolved.is_empty());
        assert!(report.is_empty());
    }

    #[test]
    fn display_and_pins() {
        let (resolved, _) = backtrack(&highest_wins_graph());
        let text = resolved.to_string();
        assert!(text.starts_with("A = \"1.0.0\"\n"));
        assert!(text.contains("D = \"1.1.0\"\n"));

        let pins = resolved.pinned_requirements();
        assert_eq!(pins.len(), 5);
        assert!(pins.contains(&Requirement::new("D", "=1.1.0")));
    }
}
