//! Release configuration declared in the manifest.
//!
//! A release names a project, the platform targets to export and the
//! variations that set it apart from other releases of the same project
//! (include tags, media filtering, extra files, packaging metadata).
//!
//! # Example
//!
//! ```yaml
//! - project: SpaceGame.agk
//!   name: demo
//!   platforms: [windows-x86, linux-x64]
//!   include_tags:
//!     demo: demo-on.agc
//!   media:
//!     exclude: [levels/full/*]
//!   include_files:
//!     - readme.txt
//!     - { src: ../LICENSE, dst: docs/LICENSE.txt }
//!   archive: true
//! ```

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AgkError, Result};
use crate::types::PlatformTarget;

/// One declared release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Path to the `.agk` project file, relative to the manifest.
    pub project: Option<PathBuf>,

    /// Release name; distinguishes several releases of one project.
    pub name: Option<String>,

    /// Overrides the project name (the `.agk` file stem).
    pub project_name: Option<String>,

    /// Overrides the version found in `main.agc`.
    pub version: Option<String>,

    /// Targets to export.
    pub platforms: Vec<PlatformTarget>,

    /// Include tag -> file mapping.
    pub include_tags: BTreeMap<String, String>,

    /// Media filtering.
    pub media: MediaFilter,

    /// Extra files copied into each output folder.
    pub include_files: Vec<IncludeFile>,

    /// Zip each output folder and remove the folder.
    pub archive: bool,

    /// Write Android and HTML5 exports to the `output_path` set in the
    /// project file instead of the release folder.
    pub use_project_output_paths: bool,

    /// Overrides for the project's `[apk_settings]` section.
    #[serde(deserialize_with = "deserialize_scalars")]
    pub apk: BTreeMap<String, String>,

    /// Overrides for the project's `[html5_settings]` section.
    #[serde(deserialize_with = "deserialize_scalars")]
    pub html5: BTreeMap<String, String>,

    /// Installer and package metadata.
    pub package: PackageMetadata,
}

impl ReleaseConfig {
    /// Human-readable label used in status output and summaries.
    pub fn label(&self) -> String {
        let project = self
            .project_name
            .clone()
            .or_else(|| {
                self.project
                    .as_ref()
                    .and_then(|p| p.file_stem())
                    .map(|s| s.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "<no project>".to_string());

        match &self.name {
            Some(name) => format!("{} ({})", project, name),
            None => project,
        }
    }
}

/// Which files of the project's `media/` folder a release ships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaFilter {
    /// Whether files not named by `include` ship.
    pub include_by_default: bool,

    /// Paths or patterns relative to `media/` that always ship.
    pub include: Vec<String>,

    /// Paths or patterns relative to `media/` that never ship.
    pub exclude: Vec<String>,
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self {
            include_by_default: true,
            include: vec![],
            exclude: vec![],
        }
    }
}

impl MediaFilter {
    /// Compile both lists into glob sets.
    pub fn compile(&self) -> Result<MediaMatcher> {
        Ok(MediaMatcher {
            include_by_default: self.include_by_default,
            include: glob_set(&self.include)?,
            exclude: glob_set(&self.exclude)?,
        })
    }
}

/// A [`MediaFilter`] with its entries compiled.
///
/// `*` also matches `/`, so `*.wav` excludes WAV files in every folder
/// and `levels/*` everything below `levels/`.
#[derive(Debug, Clone)]
pub struct MediaMatcher {
    include_by_default: bool,
    include: GlobSet,
    exclude: GlobSet,
}

impl MediaMatcher {
    /// Indices of the `include` entries matching a media-relative path.
    pub fn include_matches(&self, relative: &str) -> Vec<usize> {
        self.include.matches(relative)
    }

    /// Indices of the `exclude` entries matching a media-relative path.
    pub fn exclude_matches(&self, relative: &str) -> Vec<usize> {
        self.exclude.matches(relative)
    }

    /// Whether a media-relative path ships with this release.
    pub fn allows(&self, relative: &str) -> bool {
        !self.exclude.is_match(relative)
            && (self.include_by_default || self.include.is_match(relative))
    }
}

/// Trim, drop a leading `./` and use `/` separators.
pub fn normalize_entry(entry: &str) -> String {
    entry.trim().trim_start_matches("./").replace('\\', "/")
}

/// Whether an entry contains glob syntax.
pub fn is_pattern(entry: &str) -> bool {
    entry.contains(['*', '?', '[', '{'])
}

/// Compile media entries into one set; match indices follow `entries`.
pub fn glob_set(entries: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for entry in entries {
        let glob = Glob::new(&normalize_entry(entry)).map_err(|e| AgkError::Config {
            message: format!("Invalid media pattern '{}': {}", entry, e),
            help: Some("Media entries are paths or globs relative to media/, e.g. `sounds/*.wav`".to_string()),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| AgkError::Config {
        message: format!("Invalid media patterns: {}", e),
        help: None,
    })
}

/// An extra file to ship in output folders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IncludeFile {
    /// Copied to the same relative path inside the output folder.
    Same(PathBuf),
    /// Copied from `src` (absolute or project-relative) to `dst`.
    Mapped { src: PathBuf, dst: PathBuf },
}

impl IncludeFile {
    pub fn source(&self) -> &Path {
        match self {
            IncludeFile::Same(path) => path,
            IncludeFile::Mapped { src, .. } => src,
        }
    }

    pub fn destination(&self) -> &Path {
        match self {
            IncludeFile::Same(path) => path,
            IncludeFile::Mapped { dst, .. } => dst,
        }
    }

    /// Destination must be relative and must not climb out of the folder.
    pub fn destination_is_safe(&self) -> bool {
        let dst = self.destination();
        !dst.is_absolute()
            && dst
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    }
}

/// Metadata handed to installer and packaging tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageMetadata {
    /// Product name shown by installers (defaults to the project name).
    pub product_name: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub installer: Option<InstallerConfig>,
    pub debian: Option<DebianConfig>,
}

/// NSIS installer generation for Windows targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallerConfig {
    /// NSIS script, relative to the project folder.
    pub script: PathBuf,

    /// `makensis` executable.
    #[serde(default = "default_makensis")]
    pub makensis: PathBuf,

    /// Extra `/D` defines.
    #[serde(default, deserialize_with = "deserialize_scalars")]
    pub defines: BTreeMap<String, String>,
}

fn default_makensis() -> PathBuf {
    PathBuf::from("makensis")
}

/// Debian package generation for Linux targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebianConfig {
    /// Package name (lowercase, `[a-z0-9.+-]`).
    pub package: String,
    pub maintainer: String,
    #[serde(default = "default_section")]
    pub section: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub depends: Vec<String>,

    /// `dpkg-deb` executable.
    #[serde(default = "default_dpkg_deb")]
    pub dpkg_deb: PathBuf,
}

fn default_section() -> String {
    "games".to_string()
}

fn default_priority() -> String {
    "optional".to_string()
}

fn default_dpkg_deb() -> PathBuf {
    PathBuf::from("dpkg-deb")
}

impl DebianConfig {
    /// Debian policy: lowercase letters, digits, `+`, `-`, `.`; at least two
    /// characters; starts with an alphanumeric.
    pub fn package_name_is_valid(&self) -> bool {
        let name = &self.package;
        name.len() >= 2
            && name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "+-.".contains(c))
    }
}

/// Accept any YAML scalar (string, number, bool) as a string value.
fn deserialize_scalars<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_yaml::Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => if b { "1" } else { "0" }.to_string(),
                serde_yaml::Value::Null => String::new(),
                _ => {
                    return Err(serde::de::Error::custom(format!(
                        "setting '{}' must be a scalar value",
                        key
                    )))
                }
            };
            Ok((key, text))
        })
        .collect()
}
