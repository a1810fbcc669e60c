//! Zip archive output.
//!
//! Entries are written in name order with deflate compression and the zip
//! epoch (1980-01-01) as their timestamp, so identical inputs produce
//! byte-identical archives. The archive is staged in a temporary file and
//! renamed over `output` only once it is complete.

use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::entries::{check_entry_name, ArchiveEntries};
use crate::error::ArchiveError;
use crate::ArchiveWriter;

/// Writes entries into a single zip file.
#[derive(Debug, Clone, Copy)]
pub struct ZipArchiveWriter {
    compression: CompressionMethod,
}

impl Default for ZipArchiveWriter {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }
}

impl ZipArchiveWriter {
    /// Creates a writer that deflates every entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer that stores entries uncompressed.
    pub fn stored() -> Self {
        Self {
            compression: CompressionMethod::Stored,
        }
    }

    fn options(&self) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(self.compression)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644)
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn write(
        &self,
        entries: &ArchiveEntries<'_>,
        working_dir: &Path,
        output: &Path,
    ) -> Result<(), ArchiveError> {
        let zip_err = |e: zip::result::ZipError| ArchiveError::Zip {
            path: output.to_path_buf(),
            reason: e.to_string(),
        };
        let write_err = |e: std::io::Error| ArchiveError::Write {
            path: output.to_path_buf(),
            source: e,
        };

        for name in entries.keys() {
            check_entry_name(name)?;
        }

        // Staged next to the output so a failed write leaves the previous
        // archive in place.
        let staging_dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let staged = NamedTempFile::new_in(staging_dir).map_err(write_err)?;
        let mut zip = ZipWriter::new(BufWriter::new(staged));
        let options = self.options();

        for (name, source) in entries {
            let bytes = source
                .read(working_dir)
                .map_err(|e| ArchiveError::ReadEntry {
                    entry: name.clone(),
                    source: e,
                })?;
            zip.start_file(name.as_str(), options).map_err(zip_err)?;
            zip.write_all(&bytes).map_err(write_err)?;
        }

        let staged = zip
            .finish()
            .map_err(zip_err)?
            .into_inner()
            .map_err(|e| write_err(e.into_error()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            staged
                .as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))
                .map_err(write_err)?;
        }
        staged.persist(output).map_err(|e| write_err(e.error))?;
        debug!(archive = %output.display(), entries = entries.len(), "wrote zip archive");
        Ok(())
    }
}
