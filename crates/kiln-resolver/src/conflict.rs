//! Version conflicts collapsed by backtracking, kept for reporting.

use std::fmt;

use crate::version::Version;

/// Every version conflict encountered while backtracking.
#[derive(Debug, Default, Clone)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

/// One package occurrence that lost to a higher version of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    pub name: String,
    pub requested: Version,
    pub resolved: Version,
    /// The occurrence (and its constraint) that selected the losing version.
    pub required_by: String,
    pub reason: String,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conflict: VersionConflict) {
        self.conflicts.push(conflict);
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    /// Conflicts concerning a single package name.
    pub fn for_package<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a VersionConflict> {
        self.conflicts.iter().filter(move |c| c.name == name)
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (from {}) -> {} ({})",
            self.name, self.requested, self.required_by, self.resolved, self.reason
        )
    }
}
