//! Build orchestration.
//!
//! One build runs three stages in order:
//!
//! 1. the mode step, which produces the program artifacts,
//! 2. asset bundling,
//! 3. assembly, plus the optional bundle depfile and unpacked asset mirror.
//!
//! In kernel mode the compile step is guarded by a [`FingerprintCache`]
//! stored next to the compiler's depfile. Its inputs are the entry point,
//! every file the compiler's depfile lists, and the frontend compiler
//! itself (through `frontend_server.d`), plus the compile flags as
//! properties.

use std::collections::BTreeSet;
use std::path::PathBuf;

use bale_archive::{ArchiveWriter, DirectoryWriter};
use bale_assets::{AssetBundleProvider, AssetRequest};
use bale_cache::{BuildInputs, CacheError, Depfile, FingerprintCache, Freshness, StaleReason};
use bale_common::ContentSource;
use bale_config::paths::FRONTEND_DEPFILE;
use bale_config::BuildPaths;
use tracing::{debug, info, warn};

use crate::artifacts::{Artifact, ArtifactLocator};
use crate::assemble::{archive_entries, assemble, AssembleRequest};
use crate::compiler::{CompilationDriver, CompileRequest};
use crate::error::BuildError;
use crate::snapshot::{SnapshotGenerator, SnapshotRequest};

/// Kernel compiler settings. Every field is part of the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelOptions {
    /// Identifies the compiler build; a change forces a recompile.
    pub tool_version: String,
    /// Virtual filesystem roots.
    pub filesystem_roots: Vec<String>,
    /// Scheme addressing `filesystem_roots`.
    pub filesystem_scheme: Option<String>,
    /// Whether to instrument widget construction sites.
    pub track_widget_creation: bool,
}

/// How the program payload is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    /// Package prebuilt artifacts; no tool runs.
    Precompiled {
        /// Prebuilt snapshot, packaged as `snapshot_blob.bin`.
        snapshot: Option<PathBuf>,
        /// Prebuilt native library, packaged as `libapp.so`.
        native_library: Option<PathBuf>,
    },
    /// Generate a script snapshot on every build.
    ScriptSnapshot,
    /// Compile a kernel when its inputs changed.
    Kernel(KernelOptions),
}

impl BuildMode {
    /// Short name used in logs and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            BuildMode::Precompiled { .. } => "precompiled",
            BuildMode::ScriptSnapshot => "script-snapshot",
            BuildMode::Kernel(_) => "kernel",
        }
    }
}

/// Settings for one build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory relative paths are resolved against.
    pub working_dir: PathBuf,
    /// Program entry point.
    pub entry_point: PathBuf,
    /// Output locations.
    pub paths: BuildPaths,
    /// How the program is built.
    pub mode: BuildMode,
    /// Package resolution file passed to the tools.
    pub packages: Option<PathBuf>,
    /// Asset declarations.
    pub assets: AssetRequest,
    /// If set, a depfile listing the archive's dependencies is written here.
    pub bundle_depfile: Option<PathBuf>,
    /// If set, the archive entries are also mirrored into this directory.
    pub asset_dir: Option<PathBuf>,
    /// Ignore the fingerprint cache and recompile.
    pub force: bool,
}

impl BuildConfig {
    /// The cache guarding the kernel compile step.
    pub fn kernel_cache(&self) -> FingerprintCache {
        FingerprintCache::for_depfile(&self.paths.depfile)
    }

    /// The fingerprint inputs of the kernel compile step.
    pub fn kernel_inputs(&self, options: &KernelOptions) -> BuildInputs {
        BuildInputs::new()
            .property("entry_point", self.entry_point.display().to_string())
            .property("tool_version", options.tool_version.as_str())
            .property(
                "track_widget_creation",
                options.track_widget_creation.to_string(),
            )
            .property(
                "filesystem_scheme",
                options.filesystem_scheme.as_deref().unwrap_or(""),
            )
            .property("filesystem_roots", options.filesystem_roots.join(","))
            .path(&self.entry_point)
            .depfile(&self.paths.depfile)
            .depfile(&self.paths.frontend_depfile)
    }

    /// Decides whether the kernel compile can be skipped.
    ///
    /// Fresh only if the persisted fingerprint matches the current inputs
    /// and the kernel file from that compile still exists.
    pub fn kernel_freshness(&self, options: &KernelOptions) -> Result<Freshness, CacheError> {
        let freshness = self.kernel_cache().check(&self.kernel_inputs(options))?;
        if freshness == Freshness::Fresh && !self.paths.kernel.is_file() {
            return Ok(Freshness::Stale(StaleReason::MissingOutput(
                self.paths.kernel.clone(),
            )));
        }
        Ok(freshness)
    }
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// The written archive.
    pub archive: PathBuf,
    /// Files the archive's assets were derived from.
    pub dependencies: BTreeSet<PathBuf>,
    /// Entry names in archive order.
    pub entries: Vec<String>,
    /// Whether the kernel compile was skipped because its inputs were
    /// unchanged. Always `false` outside kernel mode.
    pub compile_skipped: bool,
}

/// Artifacts produced by the mode step.
#[derive(Debug, Default)]
struct ProgramArtifacts {
    kernel: Option<ContentSource>,
    snapshot: Option<PathBuf>,
    native_library: Option<PathBuf>,
    compile_skipped: bool,
}

/// Drives a build through its collaborators.
pub struct Orchestrator<'a> {
    compiler: &'a dyn CompilationDriver,
    snapshotter: &'a dyn SnapshotGenerator,
    assets: &'a dyn AssetBundleProvider,
    locator: &'a dyn ArtifactLocator,
    writer: &'a dyn ArchiveWriter,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(
        compiler: &'a dyn CompilationDriver,
        snapshotter: &'a dyn SnapshotGenerator,
        assets: &'a dyn AssetBundleProvider,
        locator: &'a dyn ArtifactLocator,
        writer: &'a dyn ArchiveWriter,
    ) -> Self {
        Self {
            compiler,
            snapshotter,
            assets,
            locator,
            writer,
        }
    }

    /// Runs one build.
    pub fn build(&self, config: &BuildConfig) -> Result<BuildOutcome, BuildError> {
        info!(mode = config.mode.name(), entry = %config.entry_point.display(), "starting build");
        std::fs::create_dir_all(&config.paths.build_dir).map_err(|e| BuildError::Io {
            path: config.paths.build_dir.clone(),
            source: e,
        })?;

        let program = match &config.mode {
            BuildMode::Precompiled {
                snapshot,
                native_library,
            } => ProgramArtifacts {
                snapshot: snapshot.clone(),
                native_library: native_library.clone(),
                ..ProgramArtifacts::default()
            },
            BuildMode::ScriptSnapshot => self.script_snapshot(config)?,
            BuildMode::Kernel(options) => self.kernel(config, options)?,
        };

        info!("bundling assets");
        let bundle = self.assets.build(&config.assets)?;

        let request = AssembleRequest {
            assets: &bundle,
            kernel: program.kernel.as_ref(),
            snapshot: program.snapshot.as_deref(),
            native_library: program.native_library.as_deref(),
            locator: self.locator,
            working_dir: &config.working_dir,
            output: &config.paths.archive,
        };
        let assembly = assemble(&request, self.writer)?;

        if let Some(dir) = &config.asset_dir {
            let entries = archive_entries(&request)?;
            DirectoryWriter::new().write(&entries, &config.working_dir, dir)?;
            info!(dir = %dir.display(), "asset directory written");
        }

        if let Some(path) = &config.bundle_depfile {
            Depfile::new(
                vec![assembly.archive.clone()],
                assembly.dependencies.iter().cloned().collect(),
            )
            .write(path)?;
            debug!(depfile = %path.display(), "bundle depfile written");
        }

        Ok(BuildOutcome {
            archive: assembly.archive,
            dependencies: assembly.dependencies,
            entries: assembly.entries,
            compile_skipped: program.compile_skipped,
        })
    }

    fn script_snapshot(&self, config: &BuildConfig) -> Result<ProgramArtifacts, BuildError> {
        let request = SnapshotRequest {
            entry_point: config.entry_point.clone(),
            snapshot: config.paths.snapshot.clone(),
            depfile: config.paths.depfile.clone(),
            packages: config.packages.clone(),
        };
        info!(snapshot = %request.snapshot.display(), "generating script snapshot");
        let code = self.snapshotter.build_script_snapshot(&request)?;
        if code != 0 {
            return Err(BuildError::SnapshotFailed { code });
        }
        Ok(ProgramArtifacts {
            snapshot: Some(request.snapshot),
            ..ProgramArtifacts::default()
        })
    }

    fn kernel(
        &self,
        config: &BuildConfig,
        options: &KernelOptions,
    ) -> Result<ProgramArtifacts, BuildError> {
        let cache = config.kernel_cache();
        let inputs = config.kernel_inputs(options);

        let skipped = if config.force {
            cache.invalidate()?;
            false
        } else {
            match config.kernel_freshness(options) {
                Ok(Freshness::Fresh) => true,
                Ok(Freshness::Stale(reason)) => {
                    debug!(fingerprint = %cache.path().display(), %reason, "kernel stale");
                    false
                }
                Err(e) => {
                    warn!(fingerprint = %cache.path().display(), error = %e, "fingerprint check failed; recompiling");
                    false
                }
            }
        };

        let frontend = self.locator.artifact_path(Artifact::FrontendServer)?;

        let kernel_path = if skipped {
            info!(kernel = %config.paths.kernel.display(), "kernel up to date; skipping compile");
            config.paths.kernel.clone()
        } else {
            let request = CompileRequest {
                entry_point: config.entry_point.clone(),
                sdk_root: self.locator.artifact_path(Artifact::PatchedSdk)?,
                output: config.paths.kernel.clone(),
                depfile: config.paths.depfile.clone(),
                filesystem_roots: options.filesystem_roots.clone(),
                filesystem_scheme: options.filesystem_scheme.clone(),
                packages: config.packages.clone(),
                track_widget_creation: options.track_widget_creation,
            };
            info!(kernel = %request.output.display(), "compiling kernel");
            self.compiler.compile(&request)?.output_path
        };

        Depfile::new(vec![PathBuf::from(FRONTEND_DEPFILE)], vec![frontend])
            .write(&config.paths.frontend_depfile)?;

        if !skipped {
            cache.persist_or_warn(&inputs);
        }

        Ok(ProgramArtifacts {
            kernel: Some(ContentSource::from_file(kernel_path)),
            compile_skipped: skipped,
            ..ProgramArtifacts::default()
        })
    }
}
