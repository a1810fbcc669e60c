//! Parsing and validation of `bale.toml` project configuration files.
//!
//! This crate reads the project configuration file into a strongly-typed
//! [`ProjectConfig`] and derives the default output locations of a build as
//! pure functions of the build directory ([`BuildPaths`]).

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod paths;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use paths::BuildPaths;
pub use types::*;
