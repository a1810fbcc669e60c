//! Archive assembly.
//!
//! Merges the asset bundle with the build artifacts into one entry map and
//! writes it through an [`ArchiveWriter`]. Artifacts land under fixed names:
//!
//! | Artifact | Entry |
//! |----------|-------|
//! | kernel | `kernel_blob.bin`, plus `platform.dill` from the SDK |
//! | snapshot | `snapshot_blob.bin` |
//! | native library | `libapp.so` |
//!
//! No artifact combination is rejected here; choosing a consistent set is
//! the orchestrator's job.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use bale_archive::{
    is_reserved, ArchiveEntries, ArchiveWriter, KERNEL_BLOB_ENTRY, NATIVE_LIBRARY_ENTRY,
    PLATFORM_KERNEL_ENTRY, SNAPSHOT_ENTRY,
};
use bale_assets::AssetBundle;
use bale_common::ContentSource;
use tracing::info;

use crate::artifacts::{Artifact, ArtifactLocator};
use crate::error::BuildError;

/// Everything one archive is built from.
pub struct AssembleRequest<'a> {
    /// Resolved assets.
    pub assets: &'a AssetBundle,
    /// Compiled kernel, if any.
    pub kernel: Option<&'a ContentSource>,
    /// Snapshot file, if any.
    pub snapshot: Option<&'a Path>,
    /// Native library file, if any.
    pub native_library: Option<&'a Path>,
    /// Resolves the platform kernel packaged next to a compiled kernel.
    pub locator: &'a dyn ArtifactLocator,
    /// Directory relative file entries are read from.
    pub working_dir: &'a Path,
    /// Archive path.
    pub output: &'a Path,
}

/// Result of a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    /// The written archive.
    pub archive: PathBuf,
    /// Files the archive content was derived from.
    pub dependencies: BTreeSet<PathBuf>,
    /// Entry names in archive order.
    pub entries: Vec<String>,
}

/// Builds the entry map for `request` without writing anything.
///
/// Asset sources are borrowed; artifact entries are created here.
pub fn archive_entries<'a>(
    request: &AssembleRequest<'a>,
) -> Result<ArchiveEntries<'a>, BuildError> {
    if let Some(name) = request.assets.entries().keys().find(|n| is_reserved(n)) {
        return Err(BuildError::ReservedEntryName(name.clone()));
    }

    let mut entries: ArchiveEntries<'a> = request
        .assets
        .entries()
        .iter()
        .map(|(name, source)| (name.clone(), Cow::Borrowed(source)))
        .collect();

    if let Some(kernel) = request.kernel {
        let platform = request.locator.artifact_path(Artifact::PlatformKernel)?;
        entries.insert(KERNEL_BLOB_ENTRY.to_string(), Cow::Borrowed(kernel));
        entries.insert(
            PLATFORM_KERNEL_ENTRY.to_string(),
            Cow::Owned(ContentSource::from_file(platform)),
        );
    }
    if let Some(snapshot) = request.snapshot {
        entries.insert(
            SNAPSHOT_ENTRY.to_string(),
            Cow::Owned(ContentSource::from_file(snapshot)),
        );
    }
    if let Some(library) = request.native_library {
        entries.insert(
            NATIVE_LIBRARY_ENTRY.to_string(),
            Cow::Owned(ContentSource::from_file(library)),
        );
    }
    Ok(entries)
}

/// Assembles and writes the archive described by `request`.
///
/// The returned dependency set covers the asset sources only; artifact
/// inputs are tracked by the steps that produced them.
pub fn assemble(
    request: &AssembleRequest<'_>,
    writer: &dyn ArchiveWriter,
) -> Result<Assembly, BuildError> {
    let entries = archive_entries(request)?;

    if let Some(parent) = request.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| BuildError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    writer.write(&entries, request.working_dir, request.output)?;
    info!(archive = %request.output.display(), entries = entries.len(), "archive written");

    Ok(Assembly {
        archive: request.output.to_path_buf(),
        dependencies: request.assets.dependencies(),
        entries: entries.into_keys().collect(),
    })
}
