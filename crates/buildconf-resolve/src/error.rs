//! Resolution error types.

use std::path::PathBuf;

/// Errors that can occur while resolving a target configuration.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Requested compiler has no description.
    #[error("unknown compiler '{name}'; available options: {available}")]
    UnknownCompiler {
        /// Compiler name as requested.
        name: String,
        /// Space-separated names of the known compilers.
        available: String,
    },

    /// Requested operating system has no description.
    #[error("unknown OS '{name}'; available options: {available}")]
    UnknownOs {
        /// OS name as requested.
        name: String,
        /// Space-separated names of the known operating systems.
        available: String,
    },

    /// Requested or detected processor matches no architecture.
    #[error("unknown or unidentifiable processor '{name}'; known architectures: {available}")]
    UnknownProcessor {
        /// Processor name as requested or detected.
        name: String,
        /// Space-separated names of the known architectures.
        available: String,
    },

    /// I/O error while scanning the source tree.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// The directory or file being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Result type alias for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
