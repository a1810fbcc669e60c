//! `bale status`: report whether the cached kernel is current.

use bale_build::BuildMode;
use bale_cache::{Freshness, StaleReason};

use crate::project::{resolve_build_config, resolve_project_root};
use crate::{BuildArgs, GlobalArgs};

/// Runs the `bale status` command.
///
/// Returns exit code 0 if the next build would skip the kernel compile (or
/// the configured mode has no cached step) and 1 if it would recompile.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = bale_config::load_config(&project_dir)?;
    let build_config = resolve_build_config(&project_dir, &config, &BuildArgs::default())?;

    let BuildMode::Kernel(options) = &build_config.mode else {
        println!(
            "{}: {} mode has no cached steps",
            config.project.name,
            build_config.mode.name()
        );
        return Ok(0);
    };

    let code = match build_config.kernel_freshness(options) {
        Ok(Freshness::Fresh) => {
            println!("{}: kernel up to date", config.project.name);
            0
        }
        Ok(Freshness::Stale(reason)) => {
            println!("{}: kernel stale ({reason})", config.project.name);
            if let StaleReason::InputsChanged { files, .. } = &reason {
                for file in files {
                    println!("  changed: {}", file.display());
                }
            }
            1
        }
        Err(e) => {
            println!("{}: kernel stale (fingerprint unusable: {e})", config.project.name);
            1
        }
    };
    if global.verbose {
        println!("fingerprint: {}", build_config.kernel_cache().path().display());
    }
    Ok(code)
}
