use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for keel operations and the CLI.
#[derive(Debug, Error, Diagnostic)]
pub enum KeelError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable user configuration.
    #[error("Config error: {message}")]
    #[diagnostic(help("Check ~/.keel/config.toml for syntax errors"))]
    Config { message: String },

    /// The lock file could not be read, parsed or written.
    #[error("Lock error: {message}")]
    Lock { message: String },

    /// Invalid or malformed package metadata.
    #[error("Metadata error: {message}")]
    #[diagnostic(help("Metadata must declare kind = \"Configuration\", \"Provider\" or \"Function\""))]
    Metadata { message: String },

    /// Dependency resolution failed (missing or incompatible dependencies, etc.).
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type KeelResult<T> = miette::Result<T>;
