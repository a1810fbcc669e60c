//! Project discovery and build settings shared by the CLI commands.

use std::path::{Path, PathBuf};

use bale_assets::AssetRequest;
use bale_build::{BuildConfig, BuildMode, KernelOptions};
use bale_config::{BuildPaths, ConfigError, ModeSetting, ProjectConfig, CONFIG_FILE};
use tracing::debug;

use crate::{BuildArgs, CliMode, GlobalArgs};

/// Walks up from `start` looking for the nearest directory containing `bale.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from the current directory looking for `bale.toml`.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

/// Joins `path` onto `base` unless it is already absolute.
fn resolve(base: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// Compiler settings from `[build]`, keyed on the bale version and the
/// configured compiler command line.
pub fn kernel_options(config: &ProjectConfig) -> KernelOptions {
    KernelOptions {
        tool_version: format!(
            "bale {}; compiler {}",
            env!("CARGO_PKG_VERSION"),
            config.toolchain.compiler.join(" ")
        ),
        filesystem_roots: config.build.filesystem_roots.clone(),
        filesystem_scheme: config.build.filesystem_scheme.clone(),
        track_widget_creation: config.build.track_widget_creation,
    }
}

/// The SDK root from `[toolchain]`, resolved against the project directory.
pub fn sdk_root(project_dir: &Path, config: &ProjectConfig) -> Option<PathBuf> {
    config
        .toolchain
        .sdk_root
        .as_deref()
        .map(|root| resolve(project_dir, root))
}

/// Combines `bale.toml` with command-line overrides into one build's settings.
///
/// Relative paths from either source are resolved against `project_dir`.
pub fn resolve_build_config(
    project_dir: &Path,
    config: &ProjectConfig,
    args: &BuildArgs,
) -> Result<BuildConfig, Box<dyn std::error::Error>> {
    let build_dir = resolve(project_dir, args.build_dir.as_deref().unwrap_or(&config.build.dir));
    let mut paths = BuildPaths::from_build_dir(build_dir);
    if let Some(output) = &args.output {
        paths.archive = resolve(project_dir, output);
    }
    if let Some(depfile) = &args.depfile {
        paths.depfile = resolve(project_dir, depfile);
    }

    let asset_dir = match &args.asset_dir {
        Some(Some(dir)) => Some(resolve(project_dir, dir)),
        Some(None) => Some(paths.asset_dir.clone()),
        None => None,
    };

    let mode_setting = match args.mode {
        Some(CliMode::Kernel) => ModeSetting::Kernel,
        Some(CliMode::ScriptSnapshot) => ModeSetting::ScriptSnapshot,
        Some(CliMode::Precompiled) => ModeSetting::Precompiled,
        None => config.build.mode,
    };
    let mode = match mode_setting {
        ModeSetting::Kernel => {
            if config.toolchain.sdk_root.is_none() {
                return Err(ConfigError::MissingTool {
                    mode: "kernel",
                    tool: "sdk_root",
                }
                .into());
            }
            BuildMode::Kernel(kernel_options(config))
        }
        ModeSetting::ScriptSnapshot => BuildMode::ScriptSnapshot,
        ModeSetting::Precompiled => BuildMode::Precompiled {
            snapshot: args.snapshot.as_deref().map(|p| resolve(project_dir, p)),
            native_library: args.native_library.as_deref().map(|p| resolve(project_dir, p)),
        },
    };

    let entry = args.entry.as_deref().unwrap_or(&config.project.entry);
    let build_config = BuildConfig {
        working_dir: project_dir.to_path_buf(),
        entry_point: resolve(project_dir, entry),
        paths,
        mode,
        packages: config
            .project
            .packages
            .as_deref()
            .map(|p| resolve(project_dir, p)),
        assets: AssetRequest::from_config(project_dir, config),
        bundle_depfile: args
            .bundle_depfile
            .as_deref()
            .map(|p| resolve(project_dir, p)),
        asset_dir,
        force: args.force,
    };
    debug!(config = ?build_config, "resolved build settings");
    Ok(build_config)
}
