//! Template expansion error types.

use std::path::PathBuf;

/// Errors that can occur while expanding a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A placeholder names a variable that is not bound.
    #[error("unbound variable '{placeholder}' in template {template}")]
    Unbound {
        /// Variable name without the `%` or braces.
        placeholder: String,
        /// Template the placeholder appeared in.
        template: String,
    },

    /// A `%` that does not start a valid placeholder.
    #[error("invalid placeholder in template {template}: line {line}, col {column}")]
    InvalidPlaceholder {
        /// Template the placeholder appeared in.
        template: String,
        /// 1-based line of the `%`.
        line: usize,
        /// 1-based character column of the `%`.
        column: usize,
    },

    /// I/O error reading a template file.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// The template file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Result type alias for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;
