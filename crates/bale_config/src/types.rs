//! Configuration types deserialized from `bale.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// Default entry point, relative to the project directory.
pub const DEFAULT_ENTRY: &str = "lib/main.dart";

/// Default build output directory, relative to the project directory.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// The top-level project configuration parsed from `bale.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Build settings (output directory, mode, compiler flags).
    #[serde(default)]
    pub build: BuildSettings,
    /// External tools used by the build.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// Declared asset files and directories.
    #[serde(default)]
    pub assets: AssetsConfig,
    /// Font families bundled with the application.
    #[serde(default)]
    pub fonts: Vec<FontConfig>,
}

/// Core project metadata.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Path to the program entry point.
    #[serde(default = "default_entry")]
    pub entry: String,
    /// Optional package resolution file passed to the compiler.
    #[serde(default)]
    pub packages: Option<String>,
}

fn default_entry() -> String {
    DEFAULT_ENTRY.to_string()
}

fn default_build_dir() -> String {
    DEFAULT_BUILD_DIR.to_string()
}

/// How the program itself is turned into an archive payload.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ModeSetting {
    /// Compile to a kernel, gated by the fingerprint cache (default).
    #[default]
    Kernel,
    /// Regenerate a script snapshot on every build.
    ScriptSnapshot,
    /// Package prebuilt artifacts; run no compiler.
    Precompiled,
}

/// Build configuration.
#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    /// Build output directory; every default output path derives from it.
    #[serde(default = "default_build_dir")]
    pub dir: String,
    /// Build mode.
    #[serde(default)]
    pub mode: ModeSetting,
    /// Virtual filesystem roots passed to the compiler.
    #[serde(default)]
    pub filesystem_roots: Vec<String>,
    /// Scheme under which `filesystem_roots` are addressed.
    #[serde(default)]
    pub filesystem_scheme: Option<String>,
    /// Whether the compiler should instrument widget construction sites.
    #[serde(default)]
    pub track_widget_creation: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            dir: default_build_dir(),
            mode: ModeSetting::default(),
            filesystem_roots: Vec::new(),
            filesystem_scheme: None,
            track_widget_creation: false,
        }
    }
}

/// External tool locations.
#[derive(Debug, Default, Deserialize)]
pub struct ToolchainConfig {
    /// Root of the SDK that provides the platform kernel and compiler.
    #[serde(default)]
    pub sdk_root: Option<String>,
    /// Compiler command line prefix (program followed by fixed arguments).
    ///
    /// Accepts either a single string or a list of strings.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub compiler: Vec<String>,
    /// Snapshot generator command line prefix.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub snapshotter: Vec<String>,
}

/// Declared assets.
#[derive(Debug, Default, Deserialize)]
pub struct AssetsConfig {
    /// Asset paths relative to the project directory. A trailing `/` names a
    /// directory whose files are all included.
    #[serde(default)]
    pub files: Vec<String>,
}

/// A font family and the font files that make it up.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FontConfig {
    /// Family name exposed to the runtime.
    pub family: String,
    /// Font file paths relative to the project directory.
    #[serde(default)]
    pub assets: Vec<String>,
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `compiler = "frontend"` as well as `compiler = ["dart", "fe.snapshot"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
