//! Errors raised while loading `bale.toml`.

use std::path::PathBuf;

/// Why a `bale.toml` could not be turned into a [`ProjectConfig`](crate::ProjectConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The `bale.toml` that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The content is not valid TOML or does not match the expected tables.
    #[error("invalid bale.toml: {0}")]
    Parse(String),

    /// A key that must be non-empty is empty.
    #[error("bale.toml: `{0}` must not be empty")]
    EmptyField(&'static str),

    /// The selected build mode needs a toolchain entry that is not set.
    #[error("{mode} mode requires toolchain.{tool} in bale.toml")]
    MissingTool {
        /// Build mode name as written in `build.mode`.
        mode: &'static str,
        /// Key under `[toolchain]`.
        tool: &'static str,
    },
}
