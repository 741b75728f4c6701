//! Operation: display the dependency tree.

use std::fmt::Write;

use crate::project::Project;

/// Options for `kiln tree`.
#[derive(Debug, Default)]
pub struct TreeOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show the path from the project to a dependency.
    pub why: Option<String>,
    /// Show only packages activated at more than one version.
    pub duplicates: bool,
    /// Show version conflicts collapsed by backtracking.
    pub conflicts: bool,
    /// Show the dependents of a package instead of dependencies.
    pub invert: Option<String>,
}

/// Render the dependency tree for the project.
pub fn tree(project: &Project, opts: &TreeOptions) -> miette::Result<String> {
    let resolution = project.resolve()?;
    let graph = &resolution.activated;
    let mut out = String::new();

    if let Some(target) = &opts.why {
        match graph.find_path(target) {
            Some(path) => {
                let _ = writeln!(out, "Path to {target}:");
                for (i, node) in path.iter().enumerate() {
                    let _ = writeln!(out, "{}{node}", "  ".repeat(i));
                }
            }
            None => {
                let _ = writeln!(out, "Dependency '{target}' not found in the graph.");
            }
        }
        return Ok(out);
    }

    if let Some(target) = &opts.invert {
        let inverted = graph.print_inverted_tree(target);
        if inverted.is_empty() {
            let _ = writeln!(out, "Dependency '{target}' not found in the graph.");
        } else {
            out.push_str(&inverted);
        }
        return Ok(out);
    }

    if opts.conflicts {
        let _ = writeln!(out, "{}", resolution.conflicts);
        return Ok(out);
    }

    if opts.duplicates {
        let duplicates = graph.duplicates();
        if duplicates.is_empty() {
            let _ = writeln!(out, "No duplicate versions.");
        }
        for (name, versions) in duplicates {
            let resolved = resolution
                .backtracked
                .version(name)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_string());
            let listed: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
            let _ = writeln!(out, "{name} (resolved {resolved}): {}", listed.join(", "));
        }
        return Ok(out);
    }

    out.push_str(&graph.print_tree(opts.depth));
    for cycle in &graph.cycles {
        let _ = writeln!(out, "(cycle: {} -> {})", cycle.from, cycle.to);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Overrides;
    use kiln_core::config::GlobalConfig;

    /// app -> (log ^1, net ^2); net -> log ^1.4
    fn project() -> (tempfile::TempDir, Project) {
        let tmp = tempfile::tempdir().unwrap();
        let index = tmp.path().join("index");
        std::fs::create_dir(&index).unwrap();
        std::fs::write(
            index.join("log.toml"),
            "[[versions]]\nversion = \"1.2.0\"\n\n[[versions]]\nversion = \"1.4.1\"\n",
        )
        .unwrap();
        std::fs::write(
            index.join("net.toml"),
            "[[versions]]\nversion = \"2.0.0\"\n[versions.dependencies]\nlog = \"^1.4\"\n",
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("Kiln.toml"),
            "[package]\nname = \"app\"\nversion = \"0.1.0\"\n\n[dependencies]\nlog = \"=1.2.0\"\nnet = \"^2\"\n",
        )
        .unwrap();
        let overrides = Overrides {
            registry: Some(index),
            strict: false,
        };
        let project = Project::load(tmp.path(), &overrides, &GlobalConfig::default()).unwrap();
        (tmp, project)
    }

    #[test]
    fn default_tree() {
        let (_tmp, project) = project();
        let out = tree(&project, &TreeOptions::default()).unwrap();
        assert!(out.starts_with("app v0.1.0\n"));
        assert!(out.contains("├── log v1.2.0 (=1.2.0)"));
        assert!(out.contains("└── net v2.0.0 (^2)"));
        assert!(out.contains("    └── log v1.4.1 (^1.4)"));
    }

    #[test]
    fn duplicates_and_conflicts() {
        let (_tmp, project) = project();
        let dups = tree(
            &project,
            &TreeOptions {
                duplicates: true,
                ..TreeOptions::default()
            },
        )
        .unwrap();
        assert_eq!(dups, "log (resolved 1.4.1): 1.2.0, 1.4.1\n");

        let conflicts = tree(
            &project,
            &TreeOptions {
                conflicts: true,
                ..TreeOptions::default()
            },
        )
        .unwrap();
        assert!(conflicts.contains("log 1.2.0 (from app v0.1.0 (=1.2.0)) -> 1.4.1"));
    }

    #[test]
    fn why_and_invert() {
        let (_tmp, project) = project();
        let why = tree(
            &project,
            &TreeOptions {
                why: Some("log@1.4.1".to_string()),
                ..TreeOptions::default()
            },
        )
        .unwrap();
        assert_eq!(why, "Path to log@1.4.1:\napp v0.1.0\n  net v2.0.0\n    log v1.4.1\n");

        let inverted = tree(
            &project,
            &TreeOptions {
                invert: Some("log@1.4.1".to_string()),
                ..TreeOptions::default()
            },
        )
        .unwrap();
        assert!(inverted.starts_with("log v1.4.1\n"));
        assert!(inverted.contains("└── net v2.0.0"));

        let missing = tree(
            &project,
            &TreeOptions {
                invert: Some("zlib".to_string()),
                ..TreeOptions::default()
            },
        )
        .unwrap();
        assert!(missing.contains("not found"));
    }
}
