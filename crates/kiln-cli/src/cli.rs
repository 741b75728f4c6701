//! CLI argument definitions for Kiln.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "A Cargo-inspired package manager",
    long_about = "Kiln resolves semantic-version constraints declared in Kiln.toml \
                  into one consistent version per package and records them in Kiln.lock."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Local registry index directory (overrides Kiln.toml and global config)
    #[arg(long, global = true, env = "KILN_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Fail when the chosen version of a package violates any requirement on it
    #[arg(long, global = true)]
    pub strict: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve dependencies and write Kiln.lock
    Lock {
        /// Re-resolve even if Kiln.lock is up to date
        #[arg(long)]
        force: bool,
    },

    /// Print the dependency tree
    Tree {
        /// Maximum depth
        #[arg(long)]
        depth: Option<usize>,
        /// Show packages activated at more than one version
        #[arg(long)]
        duplicates: bool,
        /// Show the dependents of a package (`name` or `name@version`)
        #[arg(short, long)]
        invert: Option<String>,
        /// Explain why a dependency is included
        #[arg(long)]
        why: Option<String>,
        /// Show version conflicts collapsed by resolution
        #[arg(long)]
        conflicts: bool,
    },

    /// Add a dependency to Kiln.toml
    Add {
        /// Package name
        name: String,
        /// Version constraint (defaults to the latest release)
        constraint: Option<String>,
        /// Add as dev dependency
        #[arg(long)]
        dev: bool,
        /// Do not update Kiln.lock afterwards
        #[arg(long)]
        no_lock: bool,
    },
}

/// Parse command-line arguments.
pub fn parse() -> Cli {
    Cli::parse()
}
