//! Build errors.

use std::path::PathBuf;

use bale_archive::ArchiveError;
use bale_assets::AssetError;
use bale_cache::CacheError;

use crate::artifacts::Artifact;

/// Errors that abort a build.
///
/// Cache lookup failures never appear here; they degrade to a rebuild inside
/// the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The compiler exited with a non-zero status.
    #[error("compiler exited with code {code}")]
    CompilerExited {
        /// The compiler's exit code.
        code: i32,
    },

    /// The compiler ran but produced no usable output.
    #[error("compilation failed: {0}")]
    CompileFailed(String),

    /// The snapshot generator exited with a non-zero status.
    #[error("snapshot generator exited with code {code}")]
    SnapshotFailed {
        /// The snapshot generator's exit code.
        code: i32,
    },

    /// An external tool could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// The program that was invoked.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// No command line is configured for a required tool.
    #[error("no {0} command configured")]
    ToolNotConfigured(&'static str),

    /// An SDK artifact does not exist.
    #[error("{artifact} not found at {path}")]
    ArtifactMissing {
        /// The artifact that was requested.
        artifact: Artifact,
        /// Where it was expected.
        path: PathBuf,
    },

    /// An asset entry uses a name the assembler fills from build artifacts.
    #[error("asset entry '{0}' collides with a reserved archive entry")]
    ReservedEntryName(String),

    /// Asset resolution failed.
    #[error(transparent)]
    Assets(#[from] AssetError),

    /// Writing the archive failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Reading or writing a depfile or fingerprint failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl BuildError {
    /// Process exit code for this error: the tool's own code where one
    /// exists, otherwise 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::CompilerExited { code } | BuildError::SnapshotFailed { code }
                if *code != 0 =>
            {
                *code
            }
            _ => 1,
        }
    }
}
