//! AppGameKit project model.
//!
//! An AGK project is a folder holding a `.agk` project file (INI format),
//! the `main.agc` entry source, a `media/` folder and optionally a
//! `Plugins/` folder.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{AgkError, Result};
use crate::types::{Architecture, Platform};

use super::ini::IniFile;

/// The entry source file compiled by AGK.
pub const MAIN_SOURCE: &str = "main.agc";

/// Files never shipped from media or plugin folders.
pub const IGNORE_FILES: &[&str] = &["Thumbs.db"];

/// An opened AGK project with per-release naming applied.
#[derive(Debug, Clone, Serialize)]
pub struct AgkProject {
    /// The `.agk` file.
    pub file: PathBuf,

    /// Folder containing the project file.
    pub base_path: PathBuf,

    /// Project name; defaults to the project file stem.
    pub name: String,

    /// Release name, used only in output folder names.
    pub release_name: Option<String>,

    /// Version from `#constant VERSION "x"` in main.agc, if any.
    pub version: Option<String>,

    #[serde(skip)]
    settings: IniFile,
}

impl AgkProject {
    /// Open a project file and scan main.agc for its version.
    pub fn open(file: &Path) -> Result<Self> {
        if !file.is_file() {
            return Err(AgkError::Io {
                path: file.to_path_buf(),
                message: "Project file not found".to_string(),
            });
        }

        let file = std::path::absolute(file).map_err(|e| AgkError::io(file, e))?;
        let settings = IniFile::load(&file)?;
        let base_path = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let main = base_path.join(MAIN_SOURCE);
        let source = std::fs::read_to_string(&main).map_err(|e| AgkError::Io {
            path: main.clone(),
            message: format!("Failed to read entry source: {}", e),
        })?;

        Ok(Self {
            file,
            base_path,
            name,
            release_name: None,
            version: find_version(&source),
            settings,
        })
    }

    pub fn main_source(&self) -> PathBuf {
        self.base_path.join(MAIN_SOURCE)
    }

    pub fn media_path(&self) -> PathBuf {
        self.base_path.join("media")
    }

    pub fn plugins_path(&self) -> PathBuf {
        self.base_path.join("Plugins")
    }

    /// Scratch folder used while assembling HTML5 and APK exports.
    pub fn temp_path(&self) -> PathBuf {
        self.base_path.join("build_tmp")
    }

    /// A value from the project file.
    pub fn setting(&self, section: &str, key: &str) -> Option<&str> {
        self.settings.get(section, key)
    }

    /// Name with everything but ASCII letters, digits and underscores removed.
    pub fn clean_name(&self) -> String {
        self.name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect()
    }

    /// Output folder name:
    /// `name[_release][_version]_platform[_arch]`.
    pub fn release_folder_name(&self, platform: &str, architecture: Option<Architecture>) -> String {
        let mut folder = self.name.clone();
        if let Some(release) = &self.release_name {
            folder.push('_');
            folder.push_str(release);
        }
        if let Some(version) = &self.version {
            folder.push('_');
            folder.push_str(version);
        }
        folder.push('_');
        folder.push_str(platform);
        if let Some(arch) = architecture {
            folder.push('_');
            folder.push_str(arch.name());
        }
        folder
    }

    /// Full path of an output folder under `<base>/release/`.
    pub fn release_folder(&self, platform: &str, architecture: Option<Architecture>) -> PathBuf {
        self.base_path
            .join("release")
            .join(self.release_folder_name(platform, architecture))
    }

    /// Output folder for a desktop or HTML5 platform.
    pub fn platform_folder(&self, platform: Platform, architecture: Option<Architecture>) -> PathBuf {
        self.release_folder(platform.name(), architecture)
    }
}

/// Find `#constant VERSION "x"` in AGK source.
pub fn find_version(source: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix("#constant")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim_start().strip_prefix("VERSION")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim_start().strip_prefix('"')?;
        let end = rest.find('"')?;
        let version = &rest[..end];
        (!version.is_empty()).then(|| version.to_string())
    })
}
