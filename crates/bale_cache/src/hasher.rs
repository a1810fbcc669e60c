//! Input file hashing.
//!
//! Computes [`FileStamp`]s (content hash, size, modification time) for the
//! files that feed a fingerprint.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use bale_common::ContentHash;

use crate::error::CacheError;
use crate::fingerprint::FileStamp;

/// Utility for stamping fingerprint input files.
pub struct FileHasher;

impl FileHasher {
    /// Computes the stamp of a single file.
    ///
    /// Reads the whole file and returns its XXH3-128 hash, byte length, and
    /// modification time in whole seconds (when the platform reports one).
    pub fn stamp(path: &Path) -> Result<FileStamp, CacheError> {
        let content = std::fs::read(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mtime = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs());
        Ok(FileStamp::new(
            ContentHash::from_bytes(&content),
            content.len() as u64,
            mtime,
        ))
    }

    /// Stamps every path in `paths`.
    ///
    /// Unlike a cache lookup, a missing file here is fatal: all missing paths
    /// are collected and reported together as [`CacheError::MissingInputs`].
    pub fn stamp_all(paths: &[PathBuf]) -> Result<BTreeMap<PathBuf, FileStamp>, CacheError> {
        let missing: Vec<PathBuf> = paths.iter().filter(|p| !p.is_file()).cloned().collect();
        if !missing.is_empty() {
            return Err(CacheError::MissingInputs { paths: missing });
        }

        let mut stamps = BTreeMap::new();
        for path in paths {
            stamps.insert(path.clone(), Self::stamp(path)?);
        }
        Ok(stamps)
    }
}
