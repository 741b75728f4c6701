//! Shared utilities for the Kiln build tool.
//!
//! This crate provides cross-cutting concerns used by all other Kiln crates:
//! error types, filesystem helpers, content hashing and status output.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod status;
