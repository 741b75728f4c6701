use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for Kiln operations above the resolver core.
#[derive(Debug, Error, Diagnostic)]
pub enum KilnError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed manifest (e.g. Kiln.toml).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your Kiln.toml for syntax errors"))]
    Manifest { message: String },

    /// Lock file could not be read, parsed or written.
    #[error("Lockfile error: {message}")]
    #[diagnostic(help("Delete Kiln.lock and run `kiln lock` to regenerate it"))]
    Lockfile { message: String },

    /// Registry index could not be located or read.
    #[error("Registry error: {message}")]
    Registry { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type KilnResult<T> = miette::Result<T>;
