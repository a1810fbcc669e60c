//! Error types for archive output.

use std::path::PathBuf;

/// Errors raised while writing an archive or asset directory.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// An entry's content could not be read.
    #[error("failed to read entry '{entry}': {source}")]
    ReadEntry {
        /// The entry name.
        entry: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The output could not be created or written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The output path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The zip encoder rejected an entry or failed to finish.
    #[error("zip error in {path}: {reason}")]
    Zip {
        /// The archive path.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// An entry name would escape the output directory.
    #[error("invalid entry name '{0}'")]
    InvalidEntryName(String),
}
