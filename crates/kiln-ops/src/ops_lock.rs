//! Operation: resolve all dependencies and regenerate Kiln.lock.

use kiln_core::lockfile::{LockedPackage, Lockfile};
use kiln_resolver::conflict::ConflictReport;
use kiln_resolver::Backtracked;

use crate::project::Project;

/// Options for `kiln lock`.
#[derive(Debug, Default)]
pub struct LockOptions {
    /// Re-resolve even if the lock file matches the manifest.
    pub force: bool,
}

/// What `lock` did.
#[derive(Debug)]
pub enum LockOutcome {
    /// The existing lock file already matches the manifest and settings.
    Fresh { packages: usize },
    Written {
        lockfile: Lockfile,
        conflicts: ConflictReport,
    },
}

/// Resolve the project and write `Kiln.lock`, unless it is already current.
pub fn lock(project: &Project, opts: &LockOptions) -> miette::Result<LockOutcome> {
    let hash = project.lock_hash();
    let lockfile_path = project.lockfile_path();

    if !opts.force && lockfile_path.is_file() {
        match Lockfile::from_path(&lockfile_path) {
            Ok(existing) if existing.is_fresh(&hash) => {
                tracing::debug!("{} is up to date", lockfile_path.display());
                return Ok(LockOutcome::Fresh {
                    packages: existing.package.len(),
                });
            }
            Ok(_) => tracing::debug!("Manifest changed since last lock"),
            Err(e) => tracing::warn!("Ignoring unreadable lock file: {e}"),
        }
    }

    let resolution = project.resolve()?;
    let lockfile = to_lockfile(Some(hash), &resolution.backtracked);
    lockfile.write_to(&lockfile_path)?;

    Ok(LockOutcome::Written {
        lockfile,
        conflicts: resolution.conflicts,
    })
}

/// Convert a resolved version set into lock file entries.
pub fn to_lockfile(manifest_hash: Option<String>, resolved: &Backtracked) -> Lockfile {
    let packages = resolved
        .iter()
        .map(|(name, pkg)| LockedPackage {
            name: name.clone(),
            version: pkg.version.to_string(),
            source: pkg.source.clone(),
        })
        .collect();
    Lockfile::generate(manifest_hash, packages)
}
