//! The `bale.toml`-driven asset provider.
//!
//! Resolves declared files and directories, adds font files, and generates
//! two in-memory entries:
//!
//! - `AssetManifest.json`: every asset name mapped to its list of variants
//!   (currently just the asset itself).
//! - `FontManifest.json`: `[{"family": .., "fonts": [{"asset": ..}]}]`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bale_common::ContentSource;
use serde::Serialize;
use tracing::debug;

use crate::bundle::{AssetBundle, AssetBundleProvider, AssetRequest, FontFamily};
use crate::error::AssetError;

/// Entry name of the generated asset manifest.
pub const ASSET_MANIFEST_ENTRY: &str = "AssetManifest.json";

/// Entry name of the generated font manifest.
pub const FONT_MANIFEST_ENTRY: &str = "FontManifest.json";

/// Asset provider backed by the declarations in `bale.toml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestAssetProvider;

#[derive(Serialize)]
struct FontManifestFamily<'a> {
    family: &'a str,
    fonts: Vec<FontManifestAsset<'a>>,
}

#[derive(Serialize)]
struct FontManifestAsset<'a> {
    asset: &'a str,
}

impl ManifestAssetProvider {
    /// Creates the provider.
    pub fn new() -> Self {
        Self
    }

    /// Resolves one declaration to `(entry name, path)` pairs.
    fn resolve_declaration(
        project_dir: &Path,
        declared: &str,
    ) -> Result<Vec<(String, PathBuf)>, AssetError> {
        if let Some(dir_name) = declared.strip_suffix('/') {
            let dir = project_dir.join(dir_name);
            if !dir.is_dir() {
                return Err(AssetError::NotFound { path: dir });
            }
            let entries = std::fs::read_dir(&dir).map_err(|e| AssetError::Io {
                path: dir.clone(),
                source: e,
            })?;

            let mut files = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|e| AssetError::Io {
                    path: dir.clone(),
                    source: e,
                })?;
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let file_name = entry.file_name().to_string_lossy().into_owned();
                files.push((format!("{}/{file_name}", normalize_entry_name(dir_name)), path));
            }
            files.sort();
            Ok(files)
        } else {
            let path = project_dir.join(declared);
            if !path.is_file() {
                return Err(AssetError::NotFound { path });
            }
            Ok(vec![(normalize_entry_name(declared), path)])
        }
    }

    fn font_manifest(fonts: &[FontFamily]) -> Result<Vec<u8>, AssetError> {
        let families: Vec<FontManifestFamily<'_>> = fonts
            .iter()
            .map(|f| FontManifestFamily {
                family: &f.family,
                fonts: f
                    .assets
                    .iter()
                    .map(|a| FontManifestAsset { asset: a })
                    .collect(),
            })
            .collect();
        serde_json::to_vec(&families).map_err(|e| AssetError::Serialization {
            entry: FONT_MANIFEST_ENTRY.to_string(),
            reason: e.to_string(),
        })
    }
}

impl AssetBundleProvider for ManifestAssetProvider {
    fn build(&self, request: &AssetRequest) -> Result<AssetBundle, AssetError> {
        let mut bundle = AssetBundle::new();
        let mut variants: BTreeMap<String, Vec<String>> = BTreeMap::new();

        let declared = request
            .assets
            .iter()
            .chain(request.fonts.iter().flat_map(|f| f.assets.iter()));
        for declaration in declared {
            for (name, path) in Self::resolve_declaration(&request.project_dir, declaration)? {
                variants.insert(name.clone(), vec![name.clone()]);
                bundle.insert(name, ContentSource::from_file(path));
            }
        }

        let asset_manifest =
            serde_json::to_vec(&variants).map_err(|e| AssetError::Serialization {
                entry: ASSET_MANIFEST_ENTRY.to_string(),
                reason: e.to_string(),
            })?;
        bundle.insert(
            ASSET_MANIFEST_ENTRY,
            ContentSource::from_bytes(asset_manifest).with_dependencies([&request.manifest_path]),
        );
        bundle.insert(
            FONT_MANIFEST_ENTRY,
            ContentSource::from_bytes(Self::font_manifest(&request.fonts)?)
                .with_dependencies([&request.manifest_path]),
        );

        debug!(entries = bundle.len(), "asset bundle resolved");
        Ok(bundle)
    }
}

/// Converts a declared relative path to an entry name with `/` separators.
fn normalize_entry_name(declared: &str) -> String {
    declared.trim_start_matches("./").replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bale_common::Content;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("assets/nested")).unwrap();
        std::fs::create_dir_all(root.join("images")).unwrap();
        std::fs::create_dir_all(root.join("fonts")).unwrap();
        std::fs::write(root.join("assets/a.txt"), "a").unwrap();
        std::fs::write(root.join("assets/b.json"), "{}").unwrap();
        std::fs::write(root.join("assets/nested/deep.txt"), "deep").unwrap();
        std::fs::write(root.join("images/logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        std::fs::write(root.join("fonts/Mono.ttf"), "ttf").unwrap();
        std::fs::write(root.join("bale.toml"), "[project]\nname = \"x\"\n").unwrap();
        dir
    }

    fn request(dir: &Path, assets: &[&str], fonts: Vec<FontFamily>) -> AssetRequest {
        AssetRequest {
            project_dir: dir.to_path_buf(),
            manifest_path: dir.join("bale.toml"),
            assets: assets.iter().map(|s| s.to_string()).collect(),
            fonts,
        }
    }

    fn manifest_json(bundle: &AssetBundle, entry: &str) -> serde_json::Value {
        match bundle.get(entry).unwrap().content() {
            Content::Memory(data) => serde_json::from_slice(data).unwrap(),
            Content::File(_) => panic!("{entry} should be generated in memory"),
        }
    }

    #[test]
    fn directory_declaration_is_not_recursive() {
        let dir = project();
        let bundle = ManifestAssetProvider::new()
            .build(&request(dir.path(), &["assets/"], vec![]))
            .unwrap();
        let names: Vec<_> = bundle.entries().keys().cloned().collect();
        assert_eq!(
            names,
            vec![
                "AssetManifest.json",
                "FontManifest.json",
                "assets/a.txt",
                "assets/b.json"
            ]
        );
    }

    #[test]
    fn file_declaration() {
        let dir = project();
        let bundle = ManifestAssetProvider::new()
            .build(&request(dir.path(), &["images/logo.png"], vec![]))
            .unwrap();
        let source = bundle.get("images/logo.png").unwrap();
        assert_eq!(
            source.file_path(),
            Some(dir.path().join("images/logo.png").as_path())
        );
    }

    #[test]
    fn missing_declaration_is_an_error() {
        let dir = project();
        let err = ManifestAssetProvider::new()
            .build(&request(dir.path(), &["images/missing.png"], vec![]))
            .unwrap_err();
        assert!(matches!(err, AssetError::NotFound { .. }));

        let err = ManifestAssetProvider::new()
            .build(&request(dir.path(), &["nope/"], vec![]))
            .unwrap_err();
        assert!(matches!(err, AssetError::NotFound { .. }));
    }

    #[test]
    fn duplicate_declarations_collapse() {
        let dir = project();
        let bundle = ManifestAssetProvider::new()
            .build(&request(
                dir.path(),
                &["assets/", "assets/a.txt", "./assets/a.txt"],
                vec![],
            ))
            .unwrap();
        assert_eq!(bundle.len(), 4);
    }

    #[test]
    fn asset_manifest_lists_every_asset() {
        let dir = project();
        let fonts = vec![FontFamily {
            family: "Mono".to_string(),
            assets: vec!["fonts/Mono.ttf".to_string()],
        }];
        let bundle = ManifestAssetProvider::new()
            .build(&request(dir.path(), &["images/logo.png"], fonts))
            .unwrap();
        let manifest = manifest_json(&bundle, ASSET_MANIFEST_ENTRY);
        assert_eq!(
            manifest,
            serde_json::json!({
                "fonts/Mono.ttf": ["fonts/Mono.ttf"],
                "images/logo.png": ["images/logo.png"],
            })
        );
    }

    #[test]
    fn font_manifest_groups_families() {
        let dir = project();
        let fonts = vec![FontFamily {
            family: "Mono".to_string(),
            assets: vec!["fonts/Mono.ttf".to_string()],
        }];
        let bundle = ManifestAssetProvider::new()
            .build(&request(dir.path(), &[], fonts))
            .unwrap();
        assert_eq!(
            manifest_json(&bundle, FONT_MANIFEST_ENTRY),
            serde_json::json!([{"family": "Mono", "fonts": [{"asset": "fonts/Mono.ttf"}]}])
        );
        assert!(bundle.get("fonts/Mono.ttf").is_some());
    }

    #[test]
    fn empty_request_still_generates_manifests() {
        let dir = project();
        let bundle = ManifestAssetProvider::new()
            .build(&request(dir.path(), &[], vec![]))
            .unwrap();
        assert_eq!(bundle.len(), 2);
        assert_eq!(manifest_json(&bundle, FONT_MANIFEST_ENTRY), serde_json::json!([]));
    }

    #[test]
    fn dependencies_cover_files_and_manifest() {
        let dir = project();
        let bundle = ManifestAssetProvider::new()
            .build(&request(dir.path(), &["assets/"], vec![]))
            .unwrap();
        let deps = bundle.dependencies();
        assert!(deps.contains(&dir.path().join("assets/a.txt")));
        assert!(deps.contains(&dir.path().join("assets/b.json")));
        assert!(deps.contains(&dir.path().join("bale.toml")));
        assert!(!deps.contains(&dir.path().join("assets/nested/deep.txt")));
        assert_eq!(deps.len(), 3);
    }

    #[test]
    fn normalize_strips_dot_prefix() {
        assert_eq!(normalize_entry_name("./a/b.png"), "a/b.png");
        assert_eq!(normalize_entry_name("a\\b.png"), "a/b.png");
    }
}
