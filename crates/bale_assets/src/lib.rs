//! Asset bundling.
//!
//! An [`AssetBundleProvider`] resolves the assets a project declares into an
//! [`AssetBundle`]: a map from archive entry name to [`ContentSource`], where
//! every source carries the files it depends on. The default
//! [`ManifestAssetProvider`] reads the `[assets]` and `[[fonts]]` sections of
//! `bale.toml` and generates the asset and font manifests the runtime reads.
//!
//! [`ContentSource`]: bale_common::ContentSource

#![warn(missing_docs)]

pub mod bundle;
pub mod error;
pub mod manifest;

pub use bundle::{AssetBundle, AssetBundleProvider, AssetRequest, FontFamily};
pub use error::AssetError;
pub use manifest::{ManifestAssetProvider, ASSET_MANIFEST_ENTRY, FONT_MANIFEST_ENTRY};
