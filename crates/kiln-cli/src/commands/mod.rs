//! Command dispatch and handler modules.

mod add;
mod lock;
mod tree;

use miette::Result;

use kiln_ops::project::{Overrides, Project};
use kiln_util::errors::KilnError;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let overrides = Overrides {
        registry: cli.registry,
        strict: cli.strict,
    };
    match cli.command {
        Command::Lock { force } => lock::exec(&overrides, force, cli.verbose),
        Command::Tree {
            depth,
            duplicates,
            invert,
            why,
            conflicts,
        } => tree::exec(&overrides, depth, duplicates, invert, why, conflicts),
        Command::Add {
            name,
            constraint,
            dev,
            no_lock,
        } => add::exec(&overrides, &name, constraint, dev, no_lock, cli.verbose),
    }
}

/// Load the project containing the current directory.
fn current_project(overrides: &Overrides) -> Result<Project> {
    let cwd = std::env::current_dir().map_err(KilnError::Io)?;
    Project::discover(&cwd, overrides)
}
