//! Operation: add a dependency to Kiln.toml.

use std::path::Path;

use kiln_resolver::{Constraint, Registry, Version};
use kiln_util::errors::KilnError;
use toml_edit::{value, DocumentMut, Item, Table};

/// Options for `kiln add`.
#[derive(Debug, Default)]
pub struct AddOptions {
    /// Package name.
    pub name: String,
    /// Version constraint; defaults to `^` the latest release in the registry.
    pub constraint: Option<String>,
    /// Add as a dev dependency.
    pub dev: bool,
}

/// Add a dependency to `Kiln.toml` using format-preserving edits.
///
/// Returns the constraint that was written.
pub fn add_dependency(
    manifest_path: &Path,
    registry: &dyn Registry,
    opts: &AddOptions,
) -> miette::Result<String> {
    let content = std::fs::read_to_string(manifest_path).map_err(|e| KilnError::Manifest {
        message: format!("Failed to read {}: {e}", manifest_path.display()),
    })?;

    let mut doc: DocumentMut = content.parse().map_err(|e| KilnError::Manifest {
        message: format!("Failed to parse Kiln.toml: {e}"),
    })?;

    let constraint = match &opts.constraint {
        Some(text) => {
            Constraint::parse(text)?;
            text.clone()
        }
        None => format!("^{}", latest_release(registry, &opts.name)?.without_build()),
    };

    let section = if opts.dev { "dev-dependencies" } else { "dependencies" };
    let table = ensure_table(&mut doc, section).ok_or_else(|| KilnError::Manifest {
        message: format!("`{section}` in Kiln.toml is not a table"),
    })?;
    match table.get_mut(&opts.name) {
        // Keep `package` and any other keys of a detailed declaration.
        Some(existing) if existing.is_table_like() => {
            tracing::info!("Updating version of existing dependency {}", opts.name);
            if let Some(detailed) = existing.as_table_like_mut() {
                detailed.insert("version", value(constraint.clone()));
            }
        }
        Some(existing) => {
            tracing::info!("Replacing existing constraint for {}", opts.name);
            *existing = value(constraint.clone());
        }
        None => {
            table.insert(&opts.name, value(constraint.clone()));
        }
    }

    kiln_util::fs::write_atomic(manifest_path, &doc.to_string()).map_err(KilnError::Io)?;
    Ok(constraint)
}

/// Highest published version of `name` that is not a pre-release.
fn latest_release(registry: &dyn Registry, name: &str) -> miette::Result<Version> {
    let entries = registry.list_versions(name).map_err(|e| KilnError::Registry {
        message: format!("failed to query {name}: {e}"),
    })?;
    entries
        .into_iter()
        .map(|entry| entry.version)
        .filter(|v| !v.is_prerelease())
        .max()
        .ok_or_else(|| {
            KilnError::Registry {
                message: format!("no released version of `{name}` in {}", registry.id()),
            }
            .into()
        })
}

/// Get or create the top-level table `key`. Inline tables are left alone.
fn ensure_table<'a>(doc: &'a mut DocumentMut, key: &str) -> Option<&'a mut Table> {
    let root = doc.as_table_mut();
    if !root.contains_key(key) {
        root.insert(key, Item::Table(Table::new()));
    }
    root.get_mut(key)?.as_table_mut()
}
