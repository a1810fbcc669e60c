//! Asset bundle types and the provider seam.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use bale_common::ContentSource;
use bale_config::{ProjectConfig, CONFIG_FILE};

use crate::error::AssetError;

/// A font family declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFamily {
    /// Family name exposed to the runtime.
    pub family: String,
    /// Font files, relative to the project directory.
    pub assets: Vec<String>,
}

/// What to bundle: the declarations plus where they are resolved from.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    /// Directory that declared asset paths are relative to.
    pub project_dir: PathBuf,
    /// The file the declarations came from. Generated manifests depend on it.
    pub manifest_path: PathBuf,
    /// Declared asset paths; a trailing `/` names a directory.
    pub assets: Vec<String>,
    /// Declared font families.
    pub fonts: Vec<FontFamily>,
}

impl AssetRequest {
    /// Builds a request from a loaded project configuration.
    pub fn from_config(project_dir: &Path, config: &ProjectConfig) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            manifest_path: project_dir.join(CONFIG_FILE),
            assets: config.assets.files.clone(),
            fonts: config
                .fonts
                .iter()
                .map(|f| FontFamily {
                    family: f.family.clone(),
                    assets: f.assets.clone(),
                })
                .collect(),
        }
    }
}

/// Named archive entries produced by an [`AssetBundleProvider`].
///
/// Entry names are unique; inserting an existing name replaces its source.
#[derive(Debug, Clone, Default)]
pub struct AssetBundle {
    entries: BTreeMap<String, ContentSource>,
}

impl AssetBundle {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, name: impl Into<String>, source: ContentSource) {
        self.entries.insert(name.into(), source);
    }

    /// Returns the entries in name order.
    pub fn entries(&self) -> &BTreeMap<String, ContentSource> {
        &self.entries
    }

    /// Returns the source for `name`.
    pub fn get(&self, name: &str) -> Option<&ContentSource> {
        self.entries.get(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bundle has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Union of the file dependencies of every entry.
    pub fn dependencies(&self) -> BTreeSet<PathBuf> {
        self.entries
            .values()
            .flat_map(|source| source.dependencies().iter().cloned())
            .collect()
    }
}

/// Resolves asset declarations into a bundle.
///
/// Any error is fatal to the build; the provider owns its own collision
/// policy for entry names.
pub trait AssetBundleProvider {
    /// Builds the bundle for `request`.
    fn build(&self, request: &AssetRequest) -> Result<AssetBundle, AssetError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_same_name() {
        let mut bundle = AssetBundle::new();
        bundle.insert("a.txt", ContentSource::from_bytes("one"));
        bundle.insert("a.txt", ContentSource::from_bytes("two"));
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.get("a.txt"), Some(&ContentSource::from_bytes("two")));
    }

    #[test]
    fn dependencies_union() {
        let mut bundle = AssetBundle::new();
        bundle.insert("a", ContentSource::from_file("assets/a"));
        bundle.insert(
            "m",
            ContentSource::from_bytes("{}").with_dependencies(["bale.toml", "assets/a"]),
        );
        let deps = bundle.dependencies();
        assert_eq!(
            deps.into_iter().collect::<Vec<_>>(),
            vec![PathBuf::from("assets/a"), PathBuf::from("bale.toml")]
        );
    }

    #[test]
    fn request_from_config() {
        let config = bale_config::load_config_from_str(
            r#"
[project]
name = "x"
[build]
mode = "precompiled"
[assets]
files = ["assets/"]
[[fonts]]
family = "Mono"
assets = ["fonts/mono.ttf"]
"#,
        )
        .unwrap();
        let req = AssetRequest::from_config(Path::new("/proj"), &config);
        assert_eq!(req.manifest_path, PathBuf::from("/proj/bale.toml"));
        assert_eq!(req.assets, vec!["assets/"]);
        assert_eq!(req.fonts[0].family, "Mono");
    }
}
