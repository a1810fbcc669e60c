//! Error types for fingerprint cache operations.

use std::path::PathBuf;

/// Errors that can occur during fingerprint cache operations.
///
/// Cache lookups are fail-safe: [`FingerprintCache::should_rebuild`] turns
/// every one of these into a rebuild. They surface directly only from the
/// explicit `check`, `load`, and `persist` operations.
///
/// [`FingerprintCache::should_rebuild`]: crate::FingerprintCache::should_rebuild
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// One or more fingerprint input files do not exist.
    #[error("fingerprint input files not found: {}", display_paths(.paths))]
    MissingInputs {
        /// Every input path that could not be found.
        paths: Vec<PathBuf>,
    },

    /// The persisted fingerprint could not be parsed.
    #[error("failed to parse fingerprint: {reason}")]
    Parse {
        /// Description of the parse failure.
        reason: String,
    },

    /// The persisted fingerprint was written in an unsupported format.
    #[error("fingerprint has format version {found}, expected {expected}")]
    FormatVersion {
        /// The format version this build understands.
        expected: u32,
        /// The format version found in the file.
        found: u32,
    },

    /// A serialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
