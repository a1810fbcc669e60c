//! Bale CLI, the command-line front end of the Bale packager.
//!
//! Provides `bale build` to compile and package a project into an archive and
//! `bale status` to report whether the cached kernel is still current.

#![warn(missing_docs)]

mod build;
mod project;
mod status;

use std::process;

use bale_build::BuildError;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "BALE_LOG";

/// Bale, an incremental bundle packager.
#[derive(Parser, Debug)]
#[command(name = "bale", version, about = "Bale bundle packager")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `bale.toml` configuration file or its directory.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile the program and package it with its assets.
    Build(BuildArgs),
    /// Report whether the cached kernel matches the current inputs.
    Status,
}

/// Arguments for the `bale build` subcommand.
///
/// Every path flag overrides the corresponding default derived from the
/// build directory.
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Build mode (defaults to `build.mode` in `bale.toml`).
    #[arg(short, long, value_enum)]
    pub mode: Option<CliMode>,

    /// Program entry point.
    #[arg(long)]
    pub entry: Option<String>,

    /// Build output directory.
    #[arg(long)]
    pub build_dir: Option<String>,

    /// Archive output path.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compiler depfile path; the kernel fingerprint is stored next to it.
    #[arg(long)]
    pub depfile: Option<String>,

    /// Prebuilt snapshot to package (precompiled mode).
    #[arg(long)]
    pub snapshot: Option<String>,

    /// Prebuilt native library to package (precompiled mode).
    #[arg(long)]
    pub native_library: Option<String>,

    /// Write a depfile listing the archive's dependencies to this path.
    #[arg(long)]
    pub bundle_depfile: Option<String>,

    /// Also mirror the archive entries into a directory
    /// (`<build-dir>/bundle_assets` when no directory is given).
    #[arg(long, value_name = "DIR", num_args = 0..=1)]
    pub asset_dir: Option<Option<String>>,

    /// Recompile even if the cached kernel is current.
    #[arg(long)]
    pub force: bool,
}

/// Build mode selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliMode {
    /// Compile a kernel, reusing the cached one when inputs are unchanged.
    Kernel,
    /// Generate a script snapshot.
    ScriptSnapshot,
    /// Package prebuilt artifacts.
    Precompiled,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Status => status::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            let code = e.downcast_ref::<BuildError>().map_or(1, BuildError::exit_code);
            process::exit(code);
        }
    }
}

/// Installs the stderr log subscriber.
///
/// `--verbose` and `--quiet` pick a fixed level; otherwise `BALE_LOG` is
/// honoured, defaulting to warnings only.
fn init_logging(global: &GlobalArgs) {
    let filter = log_filter(global, std::env::var(LOG_ENV).ok().as_deref());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Chooses the filter directive for the given flags and environment value.
fn log_filter(global: &GlobalArgs, env: Option<&str>) -> String {
    if global.verbose {
        "debug".to_string()
    } else if global.quiet {
        "error".to_string()
    } else {
        env.filter(|s| !s.trim().is_empty())
            .unwrap_or("warn")
            .to_string()
    }
}
