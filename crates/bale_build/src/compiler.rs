//! Kernel compilation.
//!
//! The frontend compiler reports its result on stdout with a boundary
//! protocol:
//!
//! ```text
//! result 4f3a9c
//! lib/main.dart:3:1: Warning: ...
//! 4f3a9c build/app.dill 0
//! ```
//!
//! The `result` line announces a boundary key; the line that later starts
//! with that key carries the output path and the error count. An empty
//! output path means compilation failed. Compilers that do not speak the
//! protocol succeed when they exit with status 0 and leave the output file
//! behind.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::error::BuildError;

/// Inputs for one kernel compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Program entry point.
    pub entry_point: PathBuf,
    /// Patched SDK directory passed as `--sdk-root`.
    pub sdk_root: PathBuf,
    /// Where the kernel is written.
    pub output: PathBuf,
    /// Where the compiler writes its depfile.
    pub depfile: PathBuf,
    /// Virtual filesystem roots.
    pub filesystem_roots: Vec<String>,
    /// Scheme addressing `filesystem_roots`.
    pub filesystem_scheme: Option<String>,
    /// Package resolution file.
    pub packages: Option<PathBuf>,
    /// Whether to instrument widget construction sites.
    pub track_widget_creation: bool,
}

/// What a successful compilation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOutput {
    /// Path of the compiled kernel.
    pub output_path: PathBuf,
    /// Number of errors the compiler reported alongside the output.
    pub error_count: u32,
}

/// Compiles a program entry point to a kernel.
pub trait CompilationDriver {
    /// Runs the compiler. Any error is fatal to the build.
    fn compile(&self, request: &CompileRequest) -> Result<CompilerOutput, BuildError>;
}

/// Runs the frontend compiler as a subprocess.
#[derive(Debug, Clone)]
pub struct SubprocessCompiler {
    program: String,
    args: Vec<String>,
}

impl SubprocessCompiler {
    /// Creates a driver for `program` with fixed leading `args`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Creates a driver from a command line whose first element is the
    /// program. An empty command yields a driver that fails with
    /// [`BuildError::ToolNotConfigured`] when run.
    pub fn from_command(command: &[String]) -> Self {
        match command.split_first() {
            Some((program, args)) => Self::new(program.clone(), args.to_vec()),
            None => Self::new(String::new(), Vec::new()),
        }
    }

    /// The full argument list passed after the program for `request`.
    pub fn arguments(&self, request: &CompileRequest) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--sdk-root".to_string());
        args.push(path_arg(&request.sdk_root));
        args.push("--target=flutter".to_string());
        args.push("--output-dill".to_string());
        args.push(path_arg(&request.output));
        args.push("--depfile".to_string());
        args.push(path_arg(&request.depfile));
        for root in &request.filesystem_roots {
            args.push("--filesystem-root".to_string());
            args.push(root.clone());
        }
        if let Some(scheme) = &request.filesystem_scheme {
            args.push("--filesystem-scheme".to_string());
            args.push(scheme.clone());
        }
        if let Some(packages) = &request.packages {
            args.push("--packages".to_string());
            args.push(path_arg(packages));
        }
        if request.track_widget_creation {
            args.push("--track-widget-creation".to_string());
        }
        args.push(path_arg(&request.entry_point));
        args
    }
}

impl CompilationDriver for SubprocessCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<CompilerOutput, BuildError> {
        if self.program.is_empty() {
            return Err(BuildError::ToolNotConfigured("compiler"));
        }
        let args = self.arguments(request);
        debug!(program = %self.program, args = ?args, "running compiler");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| BuildError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!(program = %self.program, "{}", stderr.trim_end());
        }

        if !output.status.success() {
            return Err(BuildError::CompilerExited {
                code: output.status.code().unwrap_or(1),
            });
        }

        match parse_result(&stdout) {
            Some(ResultLine {
                output_path: Some(output_path),
                error_count,
            }) => {
                if error_count > 0 {
                    warn!(errors = error_count, "compiler reported errors");
                }
                Ok(CompilerOutput {
                    output_path,
                    error_count,
                })
            }
            Some(ResultLine { error_count, .. }) => Err(BuildError::CompileFailed(format!(
                "compiler reported {error_count} error(s) and no output"
            ))),
            None if request.output.is_file() => Ok(CompilerOutput {
                output_path: request.output.clone(),
                error_count: 0,
            }),
            None => Err(BuildError::CompileFailed(format!(
                "compiler did not produce {}",
                request.output.display()
            ))),
        }
    }
}

/// The boundary-terminated result line of the compiler protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResultLine {
    output_path: Option<PathBuf>,
    error_count: u32,
}

/// Scans compiler stdout for the result protocol.
///
/// Returns `None` if no complete `result`/boundary pair is present.
fn parse_result(stdout: &str) -> Option<ResultLine> {
    let mut boundary: Option<&str> = None;
    for line in stdout.lines() {
        match boundary {
            None => {
                if let Some(key) = line.strip_prefix("result ") {
                    let key = key.trim();
                    if !key.is_empty() {
                        boundary = Some(key);
                    }
                }
            }
            Some(key) => {
                let Some(rest) = line.strip_prefix(key) else {
                    debug!("compiler: {line}");
                    continue;
                };
                let rest = rest.trim();
                let (path, count) = match rest.rsplit_once(' ') {
                    Some((path, count)) => (path.trim(), count),
                    None => ("", rest),
                };
                let error_count = count.parse().unwrap_or(0);
                let output_path = (!path.is_empty()).then(|| PathBuf::from(path));
                return Some(ResultLine {
                    output_path,
                    error_count,
                });
            }
        }
    }
    None
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
