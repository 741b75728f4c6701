//! Handler for `kiln lock`.

use miette::Result;

use kiln_ops::ops_lock::{self, LockOptions, LockOutcome};
use kiln_ops::project::{Overrides, Project};
use kiln_util::status::{status, Tone};

pub fn exec(overrides: &Overrides, force: bool, verbose: bool) -> Result<()> {
    let project = super::current_project(overrides)?;
    run(&project, force, verbose)
}

/// Lock `project` and report the outcome; shared with `kiln add`.
pub(super) fn run(project: &Project, force: bool, verbose: bool) -> Result<()> {
    match ops_lock::lock(project, &LockOptions { force })? {
        LockOutcome::Fresh { packages } => {
            status(Tone::Info, "Fresh", &format!("{packages} locked package(s)"));
        }
        LockOutcome::Written {
            lockfile,
            conflicts,
        } => {
            if verbose {
                for conflict in &conflicts.conflicts {
                    status(Tone::Warn, "Conflict", &conflict.to_string());
                }
            } else if !conflicts.is_empty() {
                status(
                    Tone::Warn,
                    "Collapsed",
                    &format!("{} version conflict(s); see `kiln tree --conflicts`", conflicts.len()),
                );
            }
            status(
                Tone::Action,
                "Locked",
                &format!("{} package(s) in {}", lockfile.package.len(), kiln_core::LOCKFILE_FILE),
            );
        }
    }
    Ok(())
}
