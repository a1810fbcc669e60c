//! `bale build`: compile the program and package it with its assets.

use bale_archive::ZipArchiveWriter;
use bale_assets::ManifestAssetProvider;
use bale_build::{Orchestrator, SdkArtifacts, SubprocessCompiler, SubprocessSnapshotter};

use crate::project::{resolve_build_config, resolve_project_root, sdk_root};
use crate::{BuildArgs, GlobalArgs};

/// Runs the `bale build` command.
///
/// Returns exit code 0 on success; build failures are returned as errors so
/// the caller can forward a tool's own exit code.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = bale_config::load_config(&project_dir)?;
    let build_config = resolve_build_config(&project_dir, &config, args)?;

    if !global.quiet {
        eprintln!(
            "   Packaging {} ({} mode)",
            config.project.name,
            build_config.mode.name()
        );
    }

    let compiler = SubprocessCompiler::from_command(&config.toolchain.compiler);
    let snapshotter = SubprocessSnapshotter::from_command(&config.toolchain.snapshotter);
    let assets = ManifestAssetProvider::new();
    let sdk = SdkArtifacts::new(sdk_root(&project_dir, &config).unwrap_or_else(|| project_dir.clone()));
    let writer = ZipArchiveWriter::new();

    let orchestrator = Orchestrator::new(&compiler, &snapshotter, &assets, &sdk, &writer);
    let outcome = orchestrator.build(&build_config)?;

    if !global.quiet {
        if outcome.compile_skipped {
            eprintln!("     Fresh kernel {}", build_config.paths.kernel.display());
        }
        eprintln!(
            "  Finished {} ({} entries, {} dependencies)",
            outcome.archive.display(),
            outcome.entries.len(),
            outcome.dependencies.len()
        );
    }
    if global.verbose {
        for entry in &outcome.entries {
            eprintln!("           {entry}");
        }
    }

    Ok(0)
}
