//! Platform targets a release can be exported for.
//!
//! A target names one concrete export: a platform plus, for desktop
//! platforms, the CPU architecture. Releases select a set of targets
//! instead of combining flag bits, so every selected target maps to
//! exactly one build action.
//!
//! # Example
//!
//! ```yaml
//! platforms: [windows-x86, windows-x64, linux-x64, html5, google-apk]
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AgkError;

/// CPU architecture for desktop exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86,
    X64,
}

impl Architecture {
    /// Short name used in folder names ("x86", "x64").
    pub fn name(&self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
        }
    }

    /// Bit width suffix used by the Linux player ("32", "64").
    pub fn bits(&self) -> &'static str {
        match self {
            Architecture::X86 => "32",
            Architecture::X64 => "64",
        }
    }

    /// Debian architecture name.
    pub fn debian_name(&self) -> &'static str {
        match self {
            Architecture::X86 => "i386",
            Architecture::X64 => "amd64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Android store flavour. The discriminant matches the `app_type` value
/// stored in AGK project files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApkType {
    Google = 0,
    Amazon = 1,
    Ouya = 2,
}

impl ApkType {
    /// Convert from the project file's numeric `app_type`.
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(ApkType::Google),
            1 => Some(ApkType::Amazon),
            2 => Some(ApkType::Ouya),
            _ => None,
        }
    }

    /// Display name ("Google", "Amazon", "Ouya").
    pub fn name(&self) -> &'static str {
        match self {
            ApkType::Google => "Google",
            ApkType::Amazon => "Amazon",
            ApkType::Ouya => "Ouya",
        }
    }

    /// Name of the AGK player source folder for this flavour.
    pub fn source_folder(&self) -> &'static str {
        match self {
            ApkType::Google => "sourceGoogle",
            ApkType::Amazon => "sourceAmazon",
            ApkType::Ouya => "sourceOuya",
        }
    }
}

impl fmt::Display for ApkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The broad platform family of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    Html5,
    Android,
}

impl Platform {
    /// Lowercase name used in release folder names.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Html5 => "html5",
            Platform::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One exportable target. Declaration order is the canonical build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformTarget {
    WindowsX86,
    WindowsX64,
    LinuxX86,
    LinuxX64,
    Html5,
    /// APK of the type configured in the project file.
    Android,
    GoogleApk,
    AmazonApk,
    OuyaApk,
}

impl PlatformTarget {
    pub const ALL: [PlatformTarget; 9] = [
        PlatformTarget::WindowsX86,
        PlatformTarget::WindowsX64,
        PlatformTarget::LinuxX86,
        PlatformTarget::LinuxX64,
        PlatformTarget::Html5,
        PlatformTarget::Android,
        PlatformTarget::GoogleApk,
        PlatformTarget::AmazonApk,
        PlatformTarget::OuyaApk,
    ];

    /// Manifest spelling of this target.
    pub fn name(&self) -> &'static str {
        match self {
            PlatformTarget::WindowsX86 => "windows-x86",
            PlatformTarget::WindowsX64 => "windows-x64",
            PlatformTarget::LinuxX86 => "linux-x86",
            PlatformTarget::LinuxX64 => "linux-x64",
            PlatformTarget::Html5 => "html5",
            PlatformTarget::Android => "android",
            PlatformTarget::GoogleApk => "google-apk",
            PlatformTarget::AmazonApk => "amazon-apk",
            PlatformTarget::OuyaApk => "ouya-apk",
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            PlatformTarget::WindowsX86 | PlatformTarget::WindowsX64 => Platform::Windows,
            PlatformTarget::LinuxX86 | PlatformTarget::LinuxX64 => Platform::Linux,
            PlatformTarget::Html5 => Platform::Html5,
            PlatformTarget::Android
            | PlatformTarget::GoogleApk
            | PlatformTarget::AmazonApk
            | PlatformTarget::OuyaApk => Platform::Android,
        }
    }

    /// Architecture for desktop targets, `None` otherwise.
    pub fn architecture(&self) -> Option<Architecture> {
        match self {
            PlatformTarget::WindowsX86 | PlatformTarget::LinuxX86 => Some(Architecture::X86),
            PlatformTarget::WindowsX64 | PlatformTarget::LinuxX64 => Some(Architecture::X64),
            _ => None,
        }
    }

    /// APK flavour forced by this target. `Android` defers to the project.
    pub fn apk_type(&self) -> Option<ApkType> {
        match self {
            PlatformTarget::GoogleApk => Some(ApkType::Google),
            PlatformTarget::AmazonApk => Some(ApkType::Amazon),
            PlatformTarget::OuyaApk => Some(ApkType::Ouya),
            _ => None,
        }
    }

    /// Whether the export produces a folder (as opposed to a single APK).
    pub fn produces_folder(&self) -> bool {
        self.platform() != Platform::Android
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlatformTarget {
    type Err = AgkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        PlatformTarget::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| AgkError::Platform {
                message: format!("Unknown platform target '{}'", s),
            })
    }
}
