use std::path::PathBuf;

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Path separators must be exactly one non-whitespace character.
    #[error("Only single character separators are supported; '{0}' given")]
    InvalidSeparator(String),

    /// Module storage could not be read.
    #[error("Failed to read module storage at {path}: {source}")]
    Io {
        /// Directory being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Convenience result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
