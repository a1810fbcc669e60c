//! Unpacked directory output.

use std::path::Path;

use tracing::debug;

use crate::entries::{check_entry_name, ArchiveEntries};
use crate::error::ArchiveError;
use crate::ArchiveWriter;

/// Mirrors entries as plain files under an output directory.
///
/// The directory is cleared first so stale entries from an earlier build do
/// not survive.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryWriter;

impl DirectoryWriter {
    /// Creates the writer.
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveWriter for DirectoryWriter {
    fn write(
        &self,
        entries: &ArchiveEntries<'_>,
        working_dir: &Path,
        output: &Path,
    ) -> Result<(), ArchiveError> {
        for name in entries.keys() {
            check_entry_name(name)?;
        }
        if output.exists() {
            std::fs::remove_dir_all(output).map_err(write_err(output))?;
        }
        std::fs::create_dir_all(output).map_err(write_err(output))?;

        for (name, source) in entries {
            let bytes = source
                .read(working_dir)
                .map_err(|e| ArchiveError::ReadEntry {
                    entry: name.clone(),
                    source: e,
                })?;
            let target = output.join(name);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(write_err(parent))?;
            }
            std::fs::write(&target, &bytes).map_err(write_err(&target))?;
        }

        debug!(dir = %output.display(), entries = entries.len(), "wrote asset directory");
        Ok(())
    }
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> ArchiveError {
    let path = path.to_path_buf();
    move |source| ArchiveError::Write { path, source }
}
