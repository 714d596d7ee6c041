//! Error types for metadata loading.

use std::path::PathBuf;

/// Errors that can occur while lexing and loading metadata files.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// Malformed token stream, unknown group, or bad `mach_opt` record.
    #[error("{detail} at {}:{line}", file.display())]
    Parse {
        /// The metadata file being read.
        file: PathBuf,
        /// 1-based line of the offending token.
        line: usize,
        /// Description of the failure.
        detail: String,
    },

    /// A key/separator/value group whose length is not a multiple of three.
    #[error(
        "malformed table <{group}> in {}: {len} tokens is not a sequence of key/separator/value triples",
        file.display()
    )]
    MalformedTable {
        /// The metadata file being read.
        file: PathBuf,
        /// Group name.
        group: String,
        /// Number of tokens found in the group.
        len: usize,
    },

    /// A scalar field whose value cannot be coerced to its declared type.
    #[error("invalid value '{value}' for {field} in {}", file.display())]
    InvalidValue {
        /// The metadata file being read.
        file: PathBuf,
        /// Scalar field name.
        field: String,
        /// The offending value.
        value: String,
    },

    /// A submodel pattern that is not a valid regular expression.
    #[error("invalid pattern '{pattern}' in {}: {source}", file.display())]
    InvalidPattern {
        /// The metadata file being read.
        file: PathBuf,
        /// The offending pattern.
        pattern: String,
        /// Underlying regex error.
        source: regex::Error,
    },

    /// Directory traversal error.
    #[error("walking {}: {source}", path.display())]
    Walk {
        /// Root of the traversal.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },

    /// I/O error reading a metadata file.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Result type for metadata operations.
pub type Result<T> = std::result::Result<T, MetaError>;
