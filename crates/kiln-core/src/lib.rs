//! Core data types for the Kiln package manager.
//!
//! This crate defines the on-disk documents of a Kiln project: the
//! `Kiln.toml` manifest, dependency specifications, the `Kiln.lock` lock file
//! and the user's global configuration.
//!
//! It has no knowledge of version semantics; constraint strings are carried
//! verbatim and interpreted by `kiln-resolver`.

/// File name of the project manifest.
pub const MANIFEST_FILE: &str = "Kiln.toml";

/// File name of the lock file written next to the manifest.
pub const LOCKFILE_FILE: &str = "Kiln.lock";

pub mod config;
pub mod dependency;
pub mod lockfile;
pub mod manifest;
