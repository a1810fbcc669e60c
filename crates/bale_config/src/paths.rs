//! Default output locations.
//!
//! Every path a build writes derives from one build directory, so callers pass
//! an explicit [`BuildPaths`] value around instead of consulting globals.

use std::path::{Path, PathBuf};

/// File name of the packaged archive.
pub const ARCHIVE_FILE: &str = "app.bale";

/// File name of the compiled kernel.
pub const KERNEL_FILE: &str = "app.dill";

/// File name of the script snapshot.
pub const SNAPSHOT_FILE: &str = "snapshot_blob.bin";

/// File name of the compile-step depfile.
pub const DEPFILE_FILE: &str = "snapshot_blob.bin.d";

/// Directory name of the unpacked asset mirror.
pub const ASSET_DIR: &str = "bundle_assets";

/// Depfile naming the frontend compiler itself as a build input.
pub const FRONTEND_DEPFILE: &str = "frontend_server.d";

/// Output locations for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    /// Base build directory.
    pub build_dir: PathBuf,
    /// Packaged archive.
    pub archive: PathBuf,
    /// Compiled kernel.
    pub kernel: PathBuf,
    /// Script snapshot.
    pub snapshot: PathBuf,
    /// Depfile written by the compiler or snapshotter.
    pub depfile: PathBuf,
    /// Unpacked asset directory.
    pub asset_dir: PathBuf,
    /// Depfile recording the frontend compiler artifact.
    pub frontend_depfile: PathBuf,
}

impl BuildPaths {
    /// Derives every default location from `build_dir`.
    pub fn from_build_dir(build_dir: impl Into<PathBuf>) -> Self {
        let build_dir = build_dir.into();
        Self {
            archive: default_archive_path(&build_dir),
            kernel: default_kernel_path(&build_dir),
            snapshot: default_snapshot_path(&build_dir),
            depfile: default_depfile_path(&build_dir),
            asset_dir: default_asset_dir(&build_dir),
            frontend_depfile: build_dir.join(FRONTEND_DEPFILE),
            build_dir,
        }
    }
}

/// `<build_dir>/app.bale`
pub fn default_archive_path(build_dir: &Path) -> PathBuf {
    build_dir.join(ARCHIVE_FILE)
}

/// `<build_dir>/app.dill`
pub fn default_kernel_path(build_dir: &Path) -> PathBuf {
    build_dir.join(KERNEL_FILE)
}

/// `<build_dir>/snapshot_blob.bin`
pub fn default_snapshot_path(build_dir: &Path) -> PathBuf {
    build_dir.join(SNAPSHOT_FILE)
}

/// `<build_dir>/snapshot_blob.bin.d`
pub fn default_depfile_path(build_dir: &Path) -> PathBuf {
    build_dir.join(DEPFILE_FILE)
}

/// `<build_dir>/bundle_assets`
pub fn default_asset_dir(build_dir: &Path) -> PathBuf {
    build_dir.join(ASSET_DIR)
}
