//! Archive payload handles.
//!
//! A [`ContentSource`] is a block of bytes (held in memory or stored in a file)
//! together with the set of paths it was derived from. Producers such as the
//! compiler driver or the asset provider own their sources; the assembler only
//! borrows them.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

/// Where the bytes of a [`ContentSource`] live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Bytes held in memory (e.g. a generated manifest).
    Memory(Vec<u8>),
    /// A file on disk. Relative paths are resolved against the working
    /// directory supplied when reading.
    File(PathBuf),
}

/// A block of bytes plus the file dependencies it was produced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSource {
    content: Content,
    dependencies: BTreeSet<PathBuf>,
}

impl ContentSource {
    /// Creates a source backed by a file. The file itself is its only dependency.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut dependencies = BTreeSet::new();
        dependencies.insert(path.clone());
        Self {
            content: Content::File(path),
            dependencies,
        }
    }

    /// Creates an in-memory source with no file dependencies.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            content: Content::Memory(data.into()),
            dependencies: BTreeSet::new(),
        }
    }

    /// Adds extra file dependencies to this source.
    pub fn with_dependencies<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dependencies.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Returns the underlying content location.
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Returns the set of paths this source depends on.
    pub fn dependencies(&self) -> &BTreeSet<PathBuf> {
        &self.dependencies
    }

    /// Returns the on-disk path if this source is file-backed.
    pub fn file_path(&self) -> Option<&Path> {
        match &self.content {
            Content::File(path) => Some(path),
            Content::Memory(_) => None,
        }
    }

    /// Reads the bytes of this source.
    ///
    /// In-memory content is borrowed; file content is read from disk, with
    /// relative paths joined onto `working_dir`.
    pub fn read(&self, working_dir: &Path) -> io::Result<Cow<'_, [u8]>> {
        match &self.content {
            Content::Memory(data) => Ok(Cow::Borrowed(data.as_slice())),
            Content::File(path) => {
                let resolved = if path.is_absolute() {
                    path.clone()
                } else {
                    working_dir.join(path)
                };
                std::fs::read(resolved).map(Cow::Owned)
            }
        }
    }
}
