//! Rebuild decisions.
//!
//! The [`FingerprintCache`] compares the fingerprint persisted after the last
//! successful build against one computed from the current inputs. The explicit
//! [`FingerprintCache::check`] reports why a step is stale;
//! [`FingerprintCache::should_rebuild`] collapses every failure into
//! "rebuild", so a broken cache can only cost time, never skip a needed build.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::depfile::Depfile;
use crate::error::CacheError;
use crate::fingerprint::Fingerprint;

/// Suffix appended to a depfile path to locate its fingerprint.
pub const FINGERPRINT_SUFFIX: &str = ".fingerprint";

/// Everything that feeds a fingerprint: fixed properties, explicit input
/// paths, and depfiles whose listed inputs are added to the set.
#[derive(Debug, Clone, Default)]
pub struct BuildInputs {
    /// Build-invariant configuration (entry point, tool version, flags).
    pub properties: BTreeMap<String, String>,
    /// Input files named directly (e.g. the entry point).
    pub paths: Vec<PathBuf>,
    /// Depfiles written by the previous run of the guarded step.
    pub depfiles: Vec<PathBuf>,
}

impl BuildInputs {
    /// Creates an empty input set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Adds an explicit input path.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Adds a depfile whose inputs join the fingerprint.
    pub fn depfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.depfiles.push(path.into());
        self
    }

    /// Returns the explicit paths plus every input listed in every depfile,
    /// sorted and deduplicated.
    ///
    /// A missing or unreadable depfile is an error.
    pub fn collect_paths(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut paths: BTreeSet<PathBuf> = self.paths.iter().cloned().collect();
        for depfile in &self.depfiles {
            paths.extend(Depfile::read(depfile)?.inputs);
        }
        Ok(paths.into_iter().collect())
    }

    /// Computes the fingerprint of these inputs.
    ///
    /// Fails if a depfile is unreadable or any input file is missing.
    pub fn fingerprint(&self) -> Result<Fingerprint, CacheError> {
        let paths = self.collect_paths()?;
        Fingerprint::from_build_inputs(self.properties.clone(), &paths)
    }
}

/// Why a cached step must run again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// No fingerprint has been persisted yet.
    NoFingerprint,
    /// A depfile from the previous run is gone.
    MissingDepfile(PathBuf),
    /// A declared input file no longer exists.
    MissingInput(PathBuf),
    /// The fingerprint matches but the step's output is gone.
    MissingOutput(PathBuf),
    /// The inputs differ from the persisted fingerprint.
    InputsChanged {
        /// Files whose stamp changed, appeared, or disappeared.
        files: Vec<PathBuf>,
        /// Whether any property changed.
        properties_changed: bool,
    },
}

impl std::fmt::Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaleReason::NoFingerprint => write!(f, "no previous fingerprint"),
            StaleReason::MissingDepfile(p) => write!(f, "depfile {} is missing", p.display()),
            StaleReason::MissingInput(p) => write!(f, "input {} is missing", p.display()),
            StaleReason::MissingOutput(p) => write!(f, "output {} is missing", p.display()),
            StaleReason::InputsChanged {
                files,
                properties_changed,
            } => {
                write!(f, "{} input file(s) changed", files.len())?;
                if *properties_changed {
                    write!(f, ", build properties changed")?;
                }
                Ok(())
            }
        }
    }
}

/// Result of comparing current inputs with the persisted fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// The persisted fingerprint matches; the step may be skipped.
    Fresh,
    /// The step must run.
    Stale(StaleReason),
}

/// Fingerprint store for a single build step.
#[derive(Debug, Clone)]
pub struct FingerprintCache {
    path: PathBuf,
}

impl FingerprintCache {
    /// Creates a cache whose fingerprint lives at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the cache guarding the step that writes `depfile`; the
    /// fingerprint is stored at `<depfile>.fingerprint`.
    pub fn for_depfile(depfile: &Path) -> Self {
        let mut name = OsString::from(depfile.as_os_str());
        name.push(FINGERPRINT_SUFFIX);
        Self::new(PathBuf::from(name))
    }

    /// Returns the fingerprint file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Compares `inputs` against the persisted fingerprint.
    ///
    /// Missing files yield `Ok(Stale(..))`; unreadable or unparseable files
    /// yield `Err`. Only a parsed fingerprint equal to a freshly computed one
    /// yields `Fresh`.
    pub fn check(&self, inputs: &BuildInputs) -> Result<Freshness, CacheError> {
        if !self.path.is_file() {
            return Ok(Freshness::Stale(StaleReason::NoFingerprint));
        }
        if let Some(depfile) = inputs.depfiles.iter().find(|d| !d.is_file()) {
            return Ok(Freshness::Stale(StaleReason::MissingDepfile(
                depfile.clone(),
            )));
        }

        let paths = inputs.collect_paths()?;
        if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
            return Ok(Freshness::Stale(StaleReason::MissingInput(missing.clone())));
        }

        let previous = self.load()?;
        let current = Fingerprint::from_build_inputs(inputs.properties.clone(), &paths)?;
        if previous == current {
            return Ok(Freshness::Fresh);
        }

        Ok(Freshness::Stale(StaleReason::InputsChanged {
            files: previous.changed_files(&current),
            properties_changed: previous.properties() != current.properties(),
        }))
    }

    /// Returns `true` unless the persisted fingerprint provably matches.
    ///
    /// Errors are logged and treated as stale.
    pub fn should_rebuild(&self, inputs: &BuildInputs) -> bool {
        match self.check(inputs) {
            Ok(Freshness::Fresh) => {
                debug!(fingerprint = %self.path.display(), "fingerprint matches");
                false
            }
            Ok(Freshness::Stale(reason)) => {
                debug!(fingerprint = %self.path.display(), %reason, "fingerprint stale");
                true
            }
            Err(e) => {
                warn!(fingerprint = %self.path.display(), error = %e, "fingerprint check failed; rebuilding");
                true
            }
        }
    }

    /// Loads the persisted fingerprint.
    pub fn load(&self) -> Result<Fingerprint, CacheError> {
        let json = std::fs::read_to_string(&self.path).map_err(|e| CacheError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        Fingerprint::from_json(&json)
    }

    /// Persists `fingerprint`, creating the parent directory if needed.
    pub fn persist(&self, fingerprint: &Fingerprint) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = fingerprint.to_json()?;
        std::fs::write(&self.path, json).map_err(|e| CacheError::Io {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Computes the fingerprint of `inputs` and persists it.
    ///
    /// Called after a successful build. Failures are logged and dropped: the
    /// artifact is already correct and the next build simply rebuilds.
    pub fn persist_or_warn(&self, inputs: &BuildInputs) {
        let result = inputs.fingerprint().and_then(|fp| self.persist(&fp));
        if let Err(e) = result {
            warn!(fingerprint = %self.path.display(), error = %e, "failed to write fingerprint");
        }
    }

    /// Deletes the persisted fingerprint so the next check is stale.
    pub fn invalidate(&self) -> Result<(), CacheError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}
