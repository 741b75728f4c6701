//! High-level operations behind the `kiln` commands.

pub mod ops_add;
pub mod ops_lock;
pub mod ops_tree;
pub mod project;
