//! End-to-end builds against a temporary project, with recording fakes in
//! place of the external compiler and snapshot generator.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use bale_archive::ZipArchiveWriter;
use bale_assets::{AssetRequest, FontFamily, ManifestAssetProvider};
use bale_build::{
    BuildConfig, BuildError, BuildMode, CompilationDriver, CompileRequest, CompilerOutput,
    KernelOptions, Orchestrator, SdkArtifacts, SnapshotGenerator, SnapshotRequest,
};
use bale_cache::{Depfile, Freshness, StaleReason};
use bale_config::BuildPaths;

/// Writes a kernel and a depfile naming the entry point plus `extra_inputs`.
#[derive(Default)]
struct RecordingCompiler {
    calls: Cell<usize>,
    extra_inputs: Vec<PathBuf>,
    fail: bool,
}

impl CompilationDriver for RecordingCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<CompilerOutput, BuildError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(BuildError::CompilerExited { code: 254 });
        }
        let source = std::fs::read(&request.entry_point).unwrap();
        let mut kernel = b"KERNEL:".to_vec();
        kernel.extend_from_slice(&source);
        std::fs::write(&request.output, kernel).unwrap();

        let mut inputs = vec![request.entry_point.clone()];
        inputs.extend(self.extra_inputs.iter().cloned());
        Depfile::new(vec![request.output.clone()], inputs)
            .write(&request.depfile)
            .unwrap();

        Ok(CompilerOutput {
            output_path: request.output.clone(),
            error_count: 0,
        })
    }
}

/// Writes a snapshot and returns a fixed exit code.
#[derive(Default)]
struct RecordingSnapshotter {
    calls: Cell<usize>,
    exit_code: i32,
}

impl SnapshotGenerator for RecordingSnapshotter {
    fn build_script_snapshot(&self, request: &SnapshotRequest) -> Result<i32, BuildError> {
        self.calls.set(self.calls.get() + 1);
        if self.exit_code == 0 {
            std::fs::write(&request.snapshot, b"SNAPSHOT").unwrap();
        }
        Ok(self.exit_code)
    }
}

struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("lib")).unwrap();
        std::fs::create_dir_all(root.join("assets")).unwrap();
        std::fs::create_dir_all(root.join("fonts")).unwrap();
        std::fs::create_dir_all(root.join("sdk/flutter_patched_sdk")).unwrap();
        std::fs::write(root.join("lib/main.dart"), "void main() {}\n").unwrap();
        std::fs::write(root.join("lib/util.dart"), "int two() => 2;\n").unwrap();
        std::fs::write(root.join("assets/hello.txt"), "hello").unwrap();
        std::fs::write(root.join("fonts/Mono.ttf"), "ttf").unwrap();
        std::fs::write(root.join("bale.toml"), "[project]\nname = \"app\"\n").unwrap();
        std::fs::write(
            root.join("sdk/flutter_patched_sdk/platform_strong.dill"),
            "PLATFORM",
        )
        .unwrap();
        std::fs::write(root.join("sdk/frontend_server.dart.snapshot"), "FRONTEND").unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn config(&self, mode: BuildMode) -> BuildConfig {
        let root = self.root();
        BuildConfig {
            working_dir: root.to_path_buf(),
            entry_point: root.join("lib/main.dart"),
            paths: BuildPaths::from_build_dir(root.join("build")),
            mode,
            packages: None,
            assets: AssetRequest {
                project_dir: root.to_path_buf(),
                manifest_path: root.join("bale.toml"),
                assets: vec!["assets/".to_string()],
                fonts: vec![FontFamily {
                    family: "Mono".to_string(),
                    assets: vec!["fonts/Mono.ttf".to_string()],
                }],
            },
            bundle_depfile: None,
            asset_dir: None,
            force: false,
        }
    }

    fn sdk(&self) -> SdkArtifacts {
        SdkArtifacts::new(self.root().join("sdk"))
    }
}

fn kernel_mode() -> BuildMode {
    BuildMode::Kernel(KernelOptions {
        tool_version: "test-compiler 1".to_string(),
        ..KernelOptions::default()
    })
}

fn run(
    project: &Project,
    config: &BuildConfig,
    compiler: &RecordingCompiler,
    snapshotter: &RecordingSnapshotter,
) -> Result<bale_build::BuildOutcome, BuildError> {
    let assets = ManifestAssetProvider::new();
    let sdk = project.sdk();
    let writer = ZipArchiveWriter::new();
    Orchestrator::new(compiler, snapshotter, &assets, &sdk, &writer).build(config)
}

fn zip_names(archive: &Path) -> BTreeSet<String> {
    let zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    zip.file_names().map(String::from).collect()
}

fn zip_entry(archive: &Path, name: &str) -> Vec<u8> {
    let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf).unwrap();
    buf
}

fn reserved(names: &BTreeSet<String>) -> Vec<&str> {
    names
        .iter()
        .map(String::as_str)
        .filter(|n| bale_archive::is_reserved(n))
        .collect()
}

#[test]
fn kernel_build_then_cached_rebuild() {
    let project = Project::new();
    let config = project.config(kernel_mode());
    let compiler = RecordingCompiler::default();
    let snapshotter = RecordingSnapshotter::default();

    let first = run(&project, &config, &compiler, &snapshotter).unwrap();
    assert_eq!(compiler.calls.get(), 1);
    assert!(!first.compile_skipped);
    assert!(config.kernel_cache().path().is_file());

    let names = zip_names(&first.archive);
    assert_eq!(reserved(&names), vec!["kernel_blob.bin", "platform.dill"]);
    assert!(names.contains("assets/hello.txt"));
    assert!(names.contains("fonts/Mono.ttf"));
    assert!(names.contains("AssetManifest.json"));
    assert!(names.contains("FontManifest.json"));
    assert_eq!(
        zip_entry(&first.archive, "kernel_blob.bin"),
        b"KERNEL:void main() {}\n"
    );
    assert_eq!(zip_entry(&first.archive, "platform.dill"), b"PLATFORM");

    let second = run(&project, &config, &compiler, &snapshotter).unwrap();
    assert_eq!(compiler.calls.get(), 1);
    assert!(second.compile_skipped);
    assert_eq!(
        reserved(&zip_names(&second.archive)),
        vec!["kernel_blob.bin", "platform.dill"]
    );
    assert_eq!(snapshotter.calls.get(), 0);
}

#[test]
fn dependency_set_is_asset_dependencies() {
    let project = Project::new();
    let config = project.config(kernel_mode());
    let outcome = run(
        &project,
        &config,
        &RecordingCompiler::default(),
        &RecordingSnapshotter::default(),
    )
    .unwrap();

    let root = project.root();
    let expected: BTreeSet<PathBuf> = [
        root.join("assets/hello.txt"),
        root.join("bale.toml"),
        root.join("fonts/Mono.ttf"),
    ]
    .into_iter()
    .collect();
    assert_eq!(outcome.dependencies, expected);
}

#[test]
fn editing_an_input_recompiles() {
    let project = Project::new();
    let config = project.config(kernel_mode());
    let compiler = RecordingCompiler {
        extra_inputs: vec![project.root().join("lib/util.dart")],
        ..RecordingCompiler::default()
    };
    let snapshotter = RecordingSnapshotter::default();

    run(&project, &config, &compiler, &snapshotter).unwrap();
    std::fs::write(project.root().join("lib/util.dart"), "int two() => 3;\n").unwrap();
    let outcome = run(&project, &config, &compiler, &snapshotter).unwrap();

    assert_eq!(compiler.calls.get(), 2);
    assert!(!outcome.compile_skipped);

    let outcome = run(&project, &config, &compiler, &snapshotter).unwrap();
    assert_eq!(compiler.calls.get(), 2);
    assert!(outcome.compile_skipped);
}

#[test]
fn changing_compile_options_recompiles() {
    let project = Project::new();
    let compiler = RecordingCompiler::default();
    let snapshotter = RecordingSnapshotter::default();

    run(&project, &project.config(kernel_mode()), &compiler, &snapshotter).unwrap();

    let tracked = BuildMode::Kernel(KernelOptions {
        tool_version: "test-compiler 1".to_string(),
        track_widget_creation: true,
        ..KernelOptions::default()
    });
    run(&project, &project.config(tracked), &compiler, &snapshotter).unwrap();
    assert_eq!(compiler.calls.get(), 2);
}

#[test]
fn force_ignores_the_cache() {
    let project = Project::new();
    let mut config = project.config(kernel_mode());
    let compiler = RecordingCompiler::default();
    let snapshotter = RecordingSnapshotter::default();

    run(&project, &config, &compiler, &snapshotter).unwrap();
    config.force = true;
    let outcome = run(&project, &config, &compiler, &snapshotter).unwrap();

    assert_eq!(compiler.calls.get(), 2);
    assert!(!outcome.compile_skipped);
}

#[test]
fn missing_kernel_recompiles_despite_fresh_fingerprint() {
    let project = Project::new();
    let config = project.config(kernel_mode());
    let compiler = RecordingCompiler::default();
    let snapshotter = RecordingSnapshotter::default();

    run(&project, &config, &compiler, &snapshotter).unwrap();
    let BuildMode::Kernel(options) = &config.mode else {
        unreachable!()
    };
    assert_eq!(config.kernel_freshness(options).unwrap(), Freshness::Fresh);

    std::fs::remove_file(&config.paths.kernel).unwrap();
    assert_eq!(
        config.kernel_freshness(options).unwrap(),
        Freshness::Stale(StaleReason::MissingOutput(config.paths.kernel.clone()))
    );
    run(&project, &config, &compiler, &snapshotter).unwrap();

    assert_eq!(compiler.calls.get(), 2);
    assert_eq!(config.kernel_freshness(options).unwrap(), Freshness::Fresh);
}

#[test]
fn corrupt_fingerprint_recompiles() {
    let project = Project::new();
    let config = project.config(kernel_mode());
    let compiler = RecordingCompiler::default();
    let snapshotter = RecordingSnapshotter::default();

    run(&project, &config, &compiler, &snapshotter).unwrap();
    std::fs::write(config.kernel_cache().path(), "{ not json").unwrap();
    run(&project, &config, &compiler, &snapshotter).unwrap();
    assert_eq!(compiler.calls.get(), 2);

    run(&project, &config, &compiler, &snapshotter).unwrap();
    assert_eq!(compiler.calls.get(), 2);
}

#[test]
fn frontend_depfile_names_the_compiler() {
    let project = Project::new();
    let config = project.config(kernel_mode());
    run(
        &project,
        &config,
        &RecordingCompiler::default(),
        &RecordingSnapshotter::default(),
    )
    .unwrap();

    let content = std::fs::read_to_string(&config.paths.frontend_depfile).unwrap();
    let frontend = project.root().join("sdk/frontend_server.dart.snapshot");
    assert_eq!(
        content,
        format!("frontend_server.d: {}\n", frontend.display())
    );
}

#[test]
fn compile_failure_is_fatal_and_not_cached() {
    let project = Project::new();
    let config = project.config(kernel_mode());
    let compiler = RecordingCompiler {
        fail: true,
        ..RecordingCompiler::default()
    };

    let err = run(&project, &config, &compiler, &RecordingSnapshotter::default()).unwrap_err();
    assert!(matches!(err, BuildError::CompilerExited { code: 254 }));
    assert_eq!(err.exit_code(), 254);
    assert!(!config.kernel_cache().path().exists());
    assert!(!config.paths.archive.exists());
}

#[test]
fn missing_platform_kernel_is_fatal() {
    let project = Project::new();
    std::fs::remove_file(
        project
            .root()
            .join("sdk/flutter_patched_sdk/platform_strong.dill"),
    )
    .unwrap();
    let config = project.config(kernel_mode());

    let err = run(
        &project,
        &config,
        &RecordingCompiler::default(),
        &RecordingSnapshotter::default(),
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::ArtifactMissing { .. }));
}

#[test]
fn missing_frontend_server_fails_before_compiling() {
    let project = Project::new();
    std::fs::remove_file(project.root().join("sdk/frontend_server.dart.snapshot")).unwrap();
    let config = project.config(kernel_mode());
    let compiler = RecordingCompiler::default();

    let err = run(&project, &config, &compiler, &RecordingSnapshotter::default()).unwrap_err();
    assert!(matches!(err, BuildError::ArtifactMissing { .. }));
    assert_eq!(compiler.calls.get(), 0);
    assert!(!config.paths.kernel.exists());
}

#[cfg(unix)]
#[test]
fn failed_rebuild_keeps_previous_archive() {
    let project = Project::new();
    let mut config = project.config(BuildMode::Precompiled {
        snapshot: None,
        native_library: None,
    });
    let compiler = RecordingCompiler::default();
    let snapshotter = RecordingSnapshotter::default();
    let outcome = run(&project, &config, &compiler, &snapshotter).unwrap();
    let before = std::fs::read(&outcome.archive).unwrap();

    std::fs::write(project.root().join("c:drive.txt"), "odd").unwrap();
    config.assets.assets.push("c:drive.txt".to_string());
    let err = run(&project, &config, &compiler, &snapshotter).unwrap_err();

    assert!(matches!(err, BuildError::Archive(_)));
    assert_eq!(std::fs::read(&outcome.archive).unwrap(), before);
}

#[test]
fn script_snapshot_runs_every_time() {
    let project = Project::new();
    let config = project.config(BuildMode::ScriptSnapshot);
    let compiler = RecordingCompiler::default();
    let snapshotter = RecordingSnapshotter::default();

    let outcome = run(&project, &config, &compiler, &snapshotter).unwrap();
    run(&project, &config, &compiler, &snapshotter).unwrap();

    assert_eq!(snapshotter.calls.get(), 2);
    assert_eq!(compiler.calls.get(), 0);
    assert!(!outcome.compile_skipped);
    let names = zip_names(&outcome.archive);
    assert_eq!(reserved(&names), vec!["snapshot_blob.bin"]);
    assert_eq!(zip_entry(&outcome.archive, "snapshot_blob.bin"), b"SNAPSHOT");
}

#[test]
fn script_snapshot_failure_forwards_exit_code() {
    let project = Project::new();
    let config = project.config(BuildMode::ScriptSnapshot);
    let snapshotter = RecordingSnapshotter {
        exit_code: 3,
        ..RecordingSnapshotter::default()
    };

    let err = run(&project, &config, &RecordingCompiler::default(), &snapshotter).unwrap_err();
    assert!(matches!(err, BuildError::SnapshotFailed { code: 3 }));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn precompiled_forwards_artifacts() {
    let project = Project::new();
    let root = project.root();
    std::fs::create_dir_all(root.join("prebuilt")).unwrap();
    std::fs::write(root.join("prebuilt/snapshot_blob.bin"), "AOT-SNAPSHOT").unwrap();
    std::fs::write(root.join("prebuilt/libapp.so"), "ELF").unwrap();

    let config = project.config(BuildMode::Precompiled {
        snapshot: Some(root.join("prebuilt/snapshot_blob.bin")),
        native_library: Some(root.join("prebuilt/libapp.so")),
    });
    let compiler = RecordingCompiler::default();
    let snapshotter = RecordingSnapshotter::default();
    let outcome = run(&project, &config, &compiler, &snapshotter).unwrap();

    assert_eq!(compiler.calls.get(), 0);
    assert_eq!(snapshotter.calls.get(), 0);
    let names = zip_names(&outcome.archive);
    assert_eq!(reserved(&names), vec!["libapp.so", "snapshot_blob.bin"]);
    assert_eq!(zip_entry(&outcome.archive, "libapp.so"), b"ELF");
}

#[test]
fn precompiled_without_artifacts_packages_assets_only() {
    let project = Project::new();
    let config = project.config(BuildMode::Precompiled {
        snapshot: None,
        native_library: None,
    });
    let outcome = run(
        &project,
        &config,
        &RecordingCompiler::default(),
        &RecordingSnapshotter::default(),
    )
    .unwrap();
    assert!(reserved(&zip_names(&outcome.archive)).is_empty());
}

#[test]
fn bundle_depfile_and_asset_dir() {
    let project = Project::new();
    let mut config = project.config(kernel_mode());
    let bundle_depfile = project.root().join("build/app.bale.d");
    config.bundle_depfile = Some(bundle_depfile.clone());
    config.asset_dir = Some(config.paths.asset_dir.clone());

    let outcome = run(
        &project,
        &config,
        &RecordingCompiler::default(),
        &RecordingSnapshotter::default(),
    )
    .unwrap();

    let depfile = Depfile::read(&bundle_depfile).unwrap();
    assert_eq!(depfile.outputs, vec![outcome.archive.clone()]);
    assert_eq!(
        depfile.inputs.into_iter().collect::<BTreeSet<_>>(),
        outcome.dependencies
    );

    let mirror = &config.paths.asset_dir;
    assert_eq!(
        std::fs::read_to_string(mirror.join("assets/hello.txt")).unwrap(),
        "hello"
    );
    assert!(mirror.join("kernel_blob.bin").is_file());
    assert!(mirror.join("AssetManifest.json").is_file());
}

#[test]
fn asset_failure_is_fatal() {
    let project = Project::new();
    let mut config = project.config(BuildMode::Precompiled {
        snapshot: None,
        native_library: None,
    });
    config.assets.assets.push("images/missing.png".to_string());

    let err = run(
        &project,
        &config,
        &RecordingCompiler::default(),
        &RecordingSnapshotter::default(),
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::Assets(_)));
    assert!(!config.paths.archive.exists());
}

#[test]
fn asset_with_reserved_name_is_rejected() {
    let project = Project::new();
    std::fs::write(project.root().join("libapp.so"), "not really").unwrap();
    let mut config = project.config(BuildMode::Precompiled {
        snapshot: None,
        native_library: None,
    });
    config.assets.assets.push("libapp.so".to_string());

    let err = run(
        &project,
        &config,
        &RecordingCompiler::default(),
        &RecordingSnapshotter::default(),
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::ReservedEntryName(ref name) if name == "libapp.so"));
}
