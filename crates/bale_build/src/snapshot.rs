//! Script snapshot generation.

use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, warn};

use crate::error::BuildError;

/// Inputs for one script snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRequest {
    /// Program entry point.
    pub entry_point: PathBuf,
    /// Where the snapshot is written.
    pub snapshot: PathBuf,
    /// Where the generator writes its depfile.
    pub depfile: PathBuf,
    /// Package resolution file.
    pub packages: Option<PathBuf>,
}

/// Produces a script snapshot from an entry point.
pub trait SnapshotGenerator {
    /// Runs the generator and returns its exit code.
    ///
    /// A non-zero code is reported, not raised; the caller decides whether
    /// it is fatal. `Err` means the generator could not be run at all.
    fn build_script_snapshot(&self, request: &SnapshotRequest) -> Result<i32, BuildError>;
}

/// Runs the snapshot generator as a subprocess.
#[derive(Debug, Clone)]
pub struct SubprocessSnapshotter {
    program: String,
    args: Vec<String>,
}

impl SubprocessSnapshotter {
    /// Creates a generator for `program` with fixed leading `args`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Creates a generator from a command line whose first element is the
    /// program. An empty command yields a generator that fails with
    /// [`BuildError::ToolNotConfigured`] when run.
    pub fn from_command(command: &[String]) -> Self {
        match command.split_first() {
            Some((program, args)) => Self::new(program.clone(), args.to_vec()),
            None => Self::new(String::new(), Vec::new()),
        }
    }

    /// The full argument list passed after the program for `request`.
    pub fn arguments(&self, request: &SnapshotRequest) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--snapshot_kind=script".to_string());
        args.push(format!("--script_snapshot={}", request.snapshot.display()));
        args.push(format!("--dependencies={}", request.depfile.display()));
        if let Some(packages) = &request.packages {
            args.push(format!("--packages={}", packages.display()));
        }
        args.push(request.entry_point.display().to_string());
        args
    }
}

impl SnapshotGenerator for SubprocessSnapshotter {
    fn build_script_snapshot(&self, request: &SnapshotRequest) -> Result<i32, BuildError> {
        if self.program.is_empty() {
            return Err(BuildError::ToolNotConfigured("snapshotter"));
        }
        let args = self.arguments(request);
        debug!(program = %self.program, args = ?args, "running snapshot generator");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| BuildError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!(program = %self.program, "{}", stderr.trim_end());
        }
        Ok(output.status.code().unwrap_or(1))
    }
}
