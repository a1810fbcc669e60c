//! Archive output.
//!
//! The assembler hands an [`ArchiveWriter`] a sorted map of named entries and
//! a working directory against which file-backed entries are resolved. Two
//! writers are provided: [`ZipArchiveWriter`] produces the distributable
//! archive, and [`DirectoryWriter`] mirrors the same entries into an unpacked
//! directory.

#![warn(missing_docs)]

pub mod directory;
pub mod entries;
pub mod error;
pub mod zip_writer;

use std::path::Path;

pub use directory::DirectoryWriter;
pub use entries::{
    is_reserved, ArchiveEntries, KERNEL_BLOB_ENTRY, NATIVE_LIBRARY_ENTRY, PLATFORM_KERNEL_ENTRY,
    RESERVED_ENTRIES, SNAPSHOT_ENTRY,
};
pub use error::ArchiveError;
pub use zip_writer::ZipArchiveWriter;

/// A sink for named archive entries.
pub trait ArchiveWriter {
    /// Writes every entry to `output`.
    ///
    /// Relative file-backed entries are read from `working_dir`. The caller
    /// has already created the parent directory of `output`.
    fn write(
        &self,
        entries: &ArchiveEntries<'_>,
        working_dir: &Path,
        output: &Path,
    ) -> Result<(), ArchiveError>;
}
