//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{ModeSetting, ProjectConfig};
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "bale.toml";

/// Loads and validates a `bale.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Read {
        path: config_path.clone(),
        source: e,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a `bale.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates required fields and that the selected mode has the tools it needs.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::EmptyField("project.name"));
    }
    if config.project.entry.is_empty() {
        return Err(ConfigError::EmptyField("project.entry"));
    }
    if config.build.dir.is_empty() {
        return Err(ConfigError::EmptyField("build.dir"));
    }
    match config.build.mode {
        ModeSetting::Kernel => {
            if config.toolchain.compiler.is_empty() {
                return Err(ConfigError::MissingTool {
                    mode: "kernel",
                    tool: "compiler",
                });
            }
            if config.toolchain.sdk_root.is_none() {
                return Err(ConfigError::MissingTool {
                    mode: "kernel",
                    tool: "sdk_root",
                });
            }
        }
        ModeSetting::ScriptSnapshot => {
            if config.toolchain.snapshotter.is_empty() {
                return Err(ConfigError::MissingTool {
                    mode: "script-snapshot",
                    tool: "snapshotter",
                });
            }
        }
        ModeSetting::Precompiled => {}
    }
    for font in &config.fonts {
        if font.family.is_empty() {
            return Err(ConfigError::EmptyField("fonts.family"));
        }
    }
    Ok(())
}
