//! Error types for asset resolution.

use std::path::PathBuf;

/// Errors that abort asset bundling. Every variant is fatal to the build.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// A declared asset file or directory does not exist.
    #[error("asset not found: {path}")]
    NotFound {
        /// The declared path, resolved against the project directory.
        path: PathBuf,
    },

    /// An I/O error occurred while listing or inspecting assets.
    #[error("asset I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A generated manifest could not be serialized.
    #[error("failed to serialize {entry}: {reason}")]
    Serialization {
        /// The manifest entry name.
        entry: String,
        /// Description of the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = AssetError::NotFound {
            path: PathBuf::from("assets/missing.png"),
        };
        assert_eq!(err.to_string(), "asset not found: assets/missing.png");
    }

    #[test]
    fn serialization_display() {
        let err = AssetError::Serialization {
            entry: "AssetManifest.json".to_string(),
            reason: "boom".to_string(),
        };
        assert!(err.to_string().contains("AssetManifest.json"));
    }
}
