//! Configuration types: the per-unit build configuration and the
//! `valence.toml` project file schema.

use crate::error::ConfigError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The runtime profile a unit is compiled against.
///
/// The profile decides which packages are always available and which
/// namespace every source file imports implicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Plain C runtime, no GLib.
    Posix,
    /// GLib/GObject runtime (default).
    #[default]
    GObject,
}

impl Profile {
    /// Packages that are always part of a unit using this profile.
    pub fn baseline_packages(self) -> &'static [&'static str] {
        match self {
            Profile::Posix => &["posix"],
            Profile::GObject => &["glib-2.0", "gobject-2.0"],
        }
    }

    /// Namespace imported into every source file and the context root.
    pub fn default_import(self) -> &'static str {
        match self {
            Profile::Posix => "Posix",
            Profile::GObject => "GLib",
        }
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posix" => Ok(Profile::Posix),
            "gobject" => Ok(Profile::GObject),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Posix => write!(f, "posix"),
            Profile::GObject => write!(f, "gobject"),
        }
    }
}

/// Search directories, by what the frontend looks for in them.
///
/// Repeating a directory flag adds to the set; it never replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchDirs {
    /// Package interface (`.vapi`) directories.
    pub vapi: BTreeSet<PathBuf>,
    /// Introspection repository (`.gir`) directories.
    pub gir: BTreeSet<PathBuf>,
    /// Introspection metadata directories.
    pub metadata: BTreeSet<PathBuf>,
    /// GResource directories.
    pub gresources: BTreeSet<PathBuf>,
}

/// Files the unit writes after a successful compile. Each is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTargets {
    /// Public package interface (`--vapi`).
    pub interface: Option<PathBuf>,
    /// Introspection repository (`--gir`).
    pub introspection: Option<PathBuf>,
    /// Internal package interface (`--internal-vapi`).
    pub internal_interface: Option<PathBuf>,
}

impl OutputTargets {
    /// Returns `true` if no output is configured.
    pub fn is_empty(&self) -> bool {
        self.interface.is_none() && self.introspection.is_none() && self.internal_interface.is_none()
    }
}

/// Boolean compiler switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    /// `--enable-experimental`
    pub experimental: bool,
    /// `--enable-experimental-non-null`
    pub experimental_non_null: bool,
    /// `--abi-stability`
    pub abi_stability: bool,
    /// `--fatal-warnings`
    pub fatal_warnings: bool,
}

/// The structured configuration of one compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    /// Packages to load. Always contains the profile's baseline packages.
    pub packages: BTreeSet<String>,
    /// Preprocessor symbols.
    pub defines: BTreeSet<String>,
    /// Search directories.
    pub search_dirs: SearchDirs,
    /// Output files.
    pub outputs: OutputTargets,
    /// Runtime profile.
    pub profile: Profile,
    /// Base directory for outputs.
    pub output_dir: PathBuf,
    /// Compiler switches.
    pub features: FeatureFlags,
    /// `--target-glib` version, if given.
    pub target_glib: Option<String>,
}

impl BuildConfiguration {
    /// A configuration with no flags applied: default profile and its
    /// baseline packages.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self {
            packages: BTreeSet::new(),
            defines: BTreeSet::new(),
            search_dirs: SearchDirs::default(),
            outputs: OutputTargets::default(),
            profile: Profile::default(),
            output_dir: output_dir.into(),
            features: FeatureFlags::default(),
            target_glib: None,
        };
        config.add_baseline_packages();
        config
    }

    /// Ensures the profile's baseline packages are present.
    pub fn add_baseline_packages(&mut self) {
        for pkg in self.profile.baseline_packages() {
            self.packages.insert((*pkg).to_string());
        }
    }
}

/// The top-level `valence.toml` project file.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata.
    pub project: ProjectMeta,
    /// Compilation units, keyed by id.
    #[serde(default)]
    pub units: BTreeMap<String, UnitConfig>,
    /// Build tasks, keyed by id.
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskConfig>,
}

/// The `[project]` table.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// Project name.
    pub name: String,
    /// Build directory, relative to the project root.
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
}

fn default_build_dir() -> String {
    "build".to_string()
}

/// A `[units.<id>]` table.
#[derive(Debug, Deserialize)]
pub struct UnitConfig {
    /// Display name; defaults to the id.
    pub name: Option<String>,
    /// Compiler-style arguments, including source files.
    #[serde(default)]
    pub args: Vec<String>,
    /// Output directory; defaults to `<build_dir>/<id>`.
    pub output_dir: Option<String>,
    /// Inputs that only exist after another step has run.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub generated: Vec<String>,
}

/// A `[tasks.<id>]` table.
#[derive(Debug, Deserialize)]
pub struct TaskConfig {
    /// Display name; defaults to the id.
    pub name: Option<String>,
    /// Program and arguments. A single string is a program without arguments.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub command: Vec<String>,
    /// Files the command reads.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub inputs: Vec<String>,
    /// Files the command writes.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub outputs: Vec<String>,
    /// Working directory; defaults to `<build_dir>/<id>`.
    pub output_dir: Option<String>,
}

/// Accepts either `key = "x"` or `key = ["x", "y"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
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
