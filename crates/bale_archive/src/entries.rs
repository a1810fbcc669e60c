//! Entry maps and reserved entry names.

use std::borrow::Cow;
use std::collections::BTreeMap;

use bale_common::ContentSource;

use crate::error::ArchiveError;

/// Entry holding the compiled kernel.
pub const KERNEL_BLOB_ENTRY: &str = "kernel_blob.bin";

/// Entry holding the platform kernel the program was compiled against.
pub const PLATFORM_KERNEL_ENTRY: &str = "platform.dill";

/// Entry holding the script or precompiled snapshot.
pub const SNAPSHOT_ENTRY: &str = "snapshot_blob.bin";

/// Entry holding the precompiled native library.
pub const NATIVE_LIBRARY_ENTRY: &str = "libapp.so";

/// Every name the assembler fills from build artifacts.
pub const RESERVED_ENTRIES: [&str; 4] = [
    KERNEL_BLOB_ENTRY,
    PLATFORM_KERNEL_ENTRY,
    SNAPSHOT_ENTRY,
    NATIVE_LIBRARY_ENTRY,
];

/// Archive entries keyed by name, iterated in sorted order.
///
/// Sources are usually borrowed from their producers; artifact entries built
/// during assembly are owned.
pub type ArchiveEntries<'a> = BTreeMap<String, Cow<'a, ContentSource>>;

/// Returns whether `name` is filled by the assembler rather than by assets.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_ENTRIES.contains(&name)
}

/// Rejects names that are empty, absolute, or contain `.`/`..` segments.
pub(crate) fn check_entry_name(name: &str) -> Result<(), ArchiveError> {
    let bad_segment = name
        .split(['/', '\\'])
        .any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad_segment || name.contains(':') {
        return Err(ArchiveError::InvalidEntryName(name.to_string()));
    }
    Ok(())
}
