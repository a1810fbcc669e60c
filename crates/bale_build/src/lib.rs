//! The packaging pipeline.
//!
//! The [`Orchestrator`] runs one build: depending on the [`BuildMode`] it
//! compiles a kernel (skipped when the [`FingerprintCache`] says the inputs
//! are unchanged), generates a script snapshot, or forwards precompiled
//! artifacts. It then resolves the asset bundle and hands everything to
//! [`assemble`], which fills the reserved archive entries and writes the
//! archive.
//!
//! External tools sit behind the [`CompilationDriver`], [`SnapshotGenerator`]
//! and [`ArtifactLocator`] traits so the pipeline can be driven by fakes in
//! tests.
//!
//! [`FingerprintCache`]: bale_cache::FingerprintCache

#![warn(missing_docs)]

pub mod artifacts;
pub mod assemble;
pub mod compiler;
pub mod error;
pub mod orchestrator;
pub mod snapshot;

pub use artifacts::{Artifact, ArtifactLocator, SdkArtifacts};
pub use assemble::{archive_entries, assemble, AssembleRequest, Assembly};
pub use compiler::{CompilationDriver, CompileRequest, CompilerOutput, SubprocessCompiler};
pub use error::BuildError;
pub use orchestrator::{BuildConfig, BuildMode, BuildOutcome, KernelOptions, Orchestrator};
pub use snapshot::{SnapshotGenerator, SnapshotRequest, SubprocessSnapshotter};
