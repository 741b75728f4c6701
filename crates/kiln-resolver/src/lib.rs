//! Dependency resolution engine: semantic versions, constraint matching,
//! dependency graph assembly and highest-wins backtracking.

pub mod activate;
pub mod backtrack;
pub mod cache;
pub mod conflict;
pub mod error;
pub mod graph;
pub mod interval;
pub mod registry;
pub mod resolver;
pub mod version;

pub use backtrack::{Backtracked, ResolvedPackage};
pub use error::ResolveError;
pub use interval::Constraint;
pub use registry::{LocalRegistry, MemoryRegistry, Registry, RegistryEntry, RegistryError, Requirement};
pub use resolver::{resolve, Resolution, ResolveOptions, Resolver};
pub use version::Version;
