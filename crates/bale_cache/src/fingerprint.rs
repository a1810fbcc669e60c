//! Build fingerprints.
//!
//! A [`Fingerprint`] is an immutable snapshot of everything that determines a
//! compilation result: a property map of build-invariant configuration and a
//! stamp for every input file. It is persisted as JSON next to the depfile of
//! the step it guards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bale_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::hasher::FileHasher;

/// Version of the persisted fingerprint layout. Files with any other version
/// fail to parse and therefore count as stale.
pub const FINGERPRINT_FORMAT_VERSION: u32 = 1;

/// Content stamp for a single input file.
///
/// Equality compares `hash` and `size` only. The modification time is
/// recorded for diagnostics; touching a file without changing its bytes does
/// not invalidate the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStamp {
    /// XXH3-128 hash of the file content.
    pub hash: ContentHash,
    /// File length in bytes.
    pub size: u64,
    /// Modification time in seconds since the Unix epoch, if known.
    #[serde(default)]
    pub mtime: Option<u64>,
}

impl FileStamp {
    /// Creates a new file stamp.
    pub fn new(hash: ContentHash, size: u64, mtime: Option<u64>) -> Self {
        Self { hash, size, mtime }
    }
}

impl PartialEq for FileStamp {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.size == other.size
    }
}

impl Eq for FileStamp {}

/// An immutable, comparable snapshot of build inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    properties: BTreeMap<String, String>,
    files: BTreeMap<PathBuf, FileStamp>,
}

#[derive(Serialize)]
struct PersistedRef<'a> {
    format_version: u32,
    properties: &'a BTreeMap<String, String>,
    files: &'a BTreeMap<PathBuf, FileStamp>,
}

#[derive(Deserialize)]
struct Persisted {
    format_version: u32,
    #[serde(default)]
    properties: BTreeMap<String, String>,
    #[serde(default)]
    files: BTreeMap<PathBuf, FileStamp>,
}

impl Fingerprint {
    /// Creates a fingerprint from precomputed properties and file stamps.
    pub fn new(properties: BTreeMap<String, String>, files: BTreeMap<PathBuf, FileStamp>) -> Self {
        Self { properties, files }
    }

    /// Computes a fingerprint by stamping every input path.
    ///
    /// Fails with [`CacheError::MissingInputs`] if any path does not exist.
    pub fn from_build_inputs(
        properties: BTreeMap<String, String>,
        paths: &[PathBuf],
    ) -> Result<Self, CacheError> {
        let files = FileHasher::stamp_all(paths)?;
        Ok(Self { properties, files })
    }

    /// Returns the build-invariant properties.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Returns the per-file stamps.
    pub fn files(&self) -> &BTreeMap<PathBuf, FileStamp> {
        &self.files
    }

    /// Returns the stamp recorded for `path`, if any.
    pub fn stamp(&self, path: &Path) -> Option<&FileStamp> {
        self.files.get(path)
    }

    /// Lists the paths whose stamp differs between `self` and `other`,
    /// including paths present in only one of them.
    pub fn changed_files(&self, other: &Fingerprint) -> Vec<PathBuf> {
        let mut changed: Vec<PathBuf> = self
            .files
            .iter()
            .filter(|(path, stamp)| other.files.get(*path) != Some(*stamp))
            .map(|(path, _)| path.clone())
            .collect();
        changed.extend(
            other
                .files
                .keys()
                .filter(|p| !self.files.contains_key(*p))
                .cloned(),
        );
        changed.sort();
        changed
    }

    /// Serializes this fingerprint to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, CacheError> {
        let persisted = PersistedRef {
            format_version: FINGERPRINT_FORMAT_VERSION,
            properties: &self.properties,
            files: &self.files,
        };
        serde_json::to_string_pretty(&persisted).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })
    }

    /// Parses a fingerprint previously produced by [`Fingerprint::to_json`].
    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        let persisted: Persisted = serde_json::from_str(json).map_err(|e| CacheError::Parse {
            reason: e.to_string(),
        })?;
        if persisted.format_version != FINGERPRINT_FORMAT_VERSION {
            return Err(CacheError::FormatVersion {
                expected: FINGERPRINT_FORMAT_VERSION,
                found: persisted.format_version,
            });
        }
        Ok(Self {
            properties: persisted.properties,
            files: persisted.files,
        })
    }
}
