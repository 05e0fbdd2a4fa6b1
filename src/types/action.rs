//! Build actions: one concrete export of a resolved release.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::platform::{ApkType, Architecture, Platform, PlatformTarget};

/// An extra file copied into an output folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFile {
    /// Absolute source path.
    pub source: PathBuf,
    /// Destination relative to the output folder.
    pub destination: PathBuf,
}

/// One export of a release for a single platform target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildAction {
    pub target: PlatformTarget,
    pub platform: Platform,
    pub architecture: Option<Architecture>,

    /// APK flavour, resolved from the project for `android`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apk_type: Option<ApkType>,

    /// Output folder, or the `.apk` file for Android targets.
    pub output: PathBuf,

    /// Extra files copied into the output folder.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_files: Vec<ResolvedFile>,

    /// NSIS installer produced from the output folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer: Option<PathBuf>,

    /// Debian package produced from the output folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debian_package: Option<PathBuf>,

    /// Zip the output folder is archived into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,
}

impl BuildAction {
    /// Create an action with only its target and output set.
    pub fn new(target: PlatformTarget, output: impl Into<PathBuf>) -> Self {
        Self {
            target,
            platform: target.platform(),
            architecture: target.architecture(),
            apk_type: target.apk_type(),
            output: output.into(),
            include_files: vec![],
            installer: None,
            debian_package: None,
            archive: None,
        }
    }

    /// Where the action's final artifact ends up.
    pub fn artifact(&self) -> &Path {
        self.archive.as_deref().unwrap_or(&self.output)
    }

    /// Short description for status output, e.g. "windows x86".
    pub fn describe(&self) -> String {
        match (self.architecture, self.apk_type) {
            (Some(arch), _) => format!("{} {}", self.platform, arch),
            (None, Some(apk)) => format!("{} APK", apk),
            (None, None) => self.platform.to_string(),
        }
    }
}
