//! Handler for `kiln add`.

use miette::Result;

use kiln_ops::ops_add::{self, AddOptions};
use kiln_ops::project::{Overrides, Project};
use kiln_util::status::{status, Tone};

pub fn exec(
    overrides: &Overrides,
    name: &str,
    constraint: Option<String>,
    dev: bool,
    no_lock: bool,
    verbose: bool,
) -> Result<()> {
    let project = super::current_project(overrides)?;

    let written = ops_add::add_dependency(
        &project.manifest_path(),
        &project.registry,
        &AddOptions {
            name: name.to_string(),
            constraint,
            dev,
        },
    )?;

    let section = if dev { "dev-dependencies" } else { "dependencies" };
    status(Tone::Action, "Adding", &format!("{name} {written} to [{section}]"));

    if no_lock {
        return Ok(());
    }
    // Reload so the new requirement is part of the resolution.
    let project = Project::load(&project.root, overrides, &kiln_core::config::GlobalConfig::load()?)?;
    super::lock::run(&project, false, verbose)
}
