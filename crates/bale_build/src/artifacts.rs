//! SDK artifact lookup.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::BuildError;

/// Files shipped with the SDK that a build reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// The platform kernel every program is compiled against. Packaged as
    /// `platform.dill` next to a compiled kernel.
    PlatformKernel,
    /// The patched SDK directory passed to the compiler as `--sdk-root`.
    PatchedSdk,
    /// The frontend compiler snapshot. Recorded as a build input so a
    /// compiler upgrade invalidates cached kernels.
    FrontendServer,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::PlatformKernel => write!(f, "platform kernel"),
            Artifact::PatchedSdk => write!(f, "patched SDK"),
            Artifact::FrontendServer => write!(f, "frontend server"),
        }
    }
}

/// Resolves [`Artifact`]s to paths.
pub trait ArtifactLocator {
    /// Returns the path of `artifact`, or [`BuildError::ArtifactMissing`] if
    /// it does not exist.
    fn artifact_path(&self, artifact: Artifact) -> Result<PathBuf, BuildError>;
}

/// Locates artifacts in the standard layout under an SDK root.
#[derive(Debug, Clone)]
pub struct SdkArtifacts {
    root: PathBuf,
}

impl SdkArtifacts {
    /// Creates a locator for the SDK at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The SDK root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of `artifact` relative to the SDK root.
    pub fn relative_path(artifact: Artifact) -> &'static str {
        match artifact {
            Artifact::PlatformKernel => "flutter_patched_sdk/platform_strong.dill",
            Artifact::PatchedSdk => "flutter_patched_sdk",
            Artifact::FrontendServer => "frontend_server.dart.snapshot",
        }
    }
}

impl ArtifactLocator for SdkArtifacts {
    fn artifact_path(&self, artifact: Artifact) -> Result<PathBuf, BuildError> {
        let path = self.root.join(Self::relative_path(artifact));
        if path.exists() {
            Ok(path)
        } else {
            Err(BuildError::ArtifactMissing { artifact, path })
        }
    }
}
