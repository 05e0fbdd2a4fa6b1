//! Release plan resolution.
//!
//! Turns each declared release into a [`ReleasePlan`]: the opened project
//! with release naming applied, the media manifest, and one
//! [`BuildAction`] per selected platform target. Resolution reads the
//! file system but never writes to it, so resolving the same releases
//! twice over an unchanged tree yields identical plans.
//!
//! # Example
//!
//! ```ignore
//! use agkbuild::plan::resolve_release;
//!
//! let plan = resolve_release(&release, Path::new("."))?;
//! for action in &plan.actions {
//!     println!("{} -> {}", action.target, action.output.display());
//! }
//! ```

mod media;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{Manifest, ReleaseConfig};
use crate::error::{AgkError, Result};
use crate::project::AgkProject;
use crate::types::{ApkType, BuildAction, Platform, PlatformTarget, ResolvedFile};
use crate::validation::validate_release;

pub use media::{scan_media, survey_media, MediaFile, MediaManifest, MediaSurvey};

/// Everything needed to build one release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
    /// Display label of the release.
    pub label: String,

    pub project: AgkProject,

    /// Include tag substitutions applied to main.agc.
    pub include_tags: BTreeMap<String, String>,

    pub media: MediaManifest,

    /// Actions in canonical target order.
    pub actions: Vec<BuildAction>,

    /// The release as declared.
    #[serde(skip)]
    pub config: ReleaseConfig,
}

impl ReleasePlan {
    /// A setting for an export: release override first, then the project file.
    pub fn setting(&self, section: &str, key: &str) -> Option<String> {
        resolve_setting(&self.project, &self.config, section, key)
    }
}

/// Look up `key` in the release's overrides for `section`, falling back to
/// the project file.
pub fn resolve_setting(
    project: &AgkProject,
    release: &ReleaseConfig,
    section: &str,
    key: &str,
) -> Option<String> {
    let overrides = match section {
        "apk_settings" => Some(&release.apk),
        "html5_settings" => Some(&release.html5),
        _ => None,
    };
    overrides
        .and_then(|o| o.get(key).cloned())
        .or_else(|| project.setting(section, key).map(str::to_string))
}

/// The APK flavour the `android` target exports.
pub fn project_apk_type(project: &AgkProject, overrides: &BTreeMap<String, String>) -> Result<ApkType> {
    let raw = overrides
        .get("app_type")
        .map(String::as_str)
        .or_else(|| project.setting("apk_settings", "app_type"))
        .ok_or_else(|| AgkError::Config {
            message: format!("{} does not set an APK app_type", project.file.display()),
            help: Some("Set `apk: { app_type: 0 }` (0 Google, 1 Amazon, 2 Ouya)".to_string()),
        })?;

    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(ApkType::from_index)
        .ok_or_else(|| AgkError::Config {
            message: format!("Invalid APK app_type '{}'", raw),
            help: Some("Use 0 (Google), 1 (Amazon) or 2 (Ouya)".to_string()),
        })
}

/// Resolve every release of a manifest, in order. Each release resolves
/// independently; one failing does not stop the others.
pub fn resolve_all(manifest: &Manifest, root: &Path) -> Vec<(String, Result<ReleasePlan>)> {
    manifest
        .releases
        .iter()
        .map(|release| (release.label(), resolve_release(release, root)))
        .collect()
}

/// Resolve one release. `root` is the folder the manifest lives in.
pub fn resolve_release(release: &ReleaseConfig, root: &Path) -> Result<ReleasePlan> {
    let label = release.label();

    let project_file = release.project.as_ref().ok_or_else(|| AgkError::MissingField {
        release: label.clone(),
        field: "project".to_string(),
    })?;
    if release.platforms.is_empty() {
        return Err(AgkError::MissingField {
            release: label,
            field: "platforms".to_string(),
        });
    }

    let targets = target_set(&release.platforms)?;
    let mut project = AgkProject::open(&root.join(project_file))?;

    if targets.contains(&PlatformTarget::Android) {
        let apk_type = project_apk_type(&project, &release.apk)?;
        if targets.iter().any(|t| t.apk_type() == Some(apk_type)) {
            return Err(AgkError::Platform {
                message: format!(
                    "'android' resolves to the {} APK, which is also selected explicitly",
                    apk_type
                ),
            });
        }
    }

    // Media problems keep their own error kinds.
    let media = scan_media(&project.media_path(), &release.media)?;

    let diagnostics = validate_release(release, root);
    if let Some(first) = diagnostics.first_error() {
        return Err(AgkError::Validation {
            message: first.to_string(),
            help: first
                .help
                .clone()
                .or_else(|| Some("Run `agkbuild validate` for all diagnostics".to_string())),
        });
    }

    if let Some(name) = &release.project_name {
        project.name = name.clone();
    }
    if let Some(version) = &release.version {
        project.version = Some(version.clone());
    }
    project.release_name = release.name.clone();

    let actions = targets
        .iter()
        .map(|target| resolve_action(*target, &project, release, &label))
        .collect::<Result<Vec<_>>>()?;

    Ok(ReleasePlan {
        label,
        project,
        include_tags: release.include_tags.clone(),
        media,
        actions,
        config: release.clone(),
    })
}

/// Deduplicate into canonical order, rejecting repeats.
fn target_set(platforms: &[PlatformTarget]) -> Result<BTreeSet<PlatformTarget>> {
    let mut set = BTreeSet::new();
    for target in platforms {
        if !set.insert(*target) {
            return Err(AgkError::Platform {
                message: format!("Platform target '{}' is listed more than once", target),
            });
        }
    }
    Ok(set)
}

fn resolve_action(
    target: PlatformTarget,
    project: &AgkProject,
    release: &ReleaseConfig,
    label: &str,
) -> Result<BuildAction> {
    if target.platform() == Platform::Android {
        let apk_type = match target.apk_type() {
            Some(forced) => forced,
            None => project_apk_type(project, &release.apk)?,
        };
        let build = resolve_setting(project, release, "apk_settings", "version_number")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AgkError::MissingField {
                release: label.to_string(),
                field: "apk.version_number".to_string(),
            })?;
        let build: u32 = build.trim().parse().map_err(|_| AgkError::Config {
            message: format!("APK version_number '{}' is not a whole number", build),
            help: None,
        })?;

        let output = if release.use_project_output_paths {
            let path = project_output_path(project, release, "apk_settings", "apk", label)?
                .replace("%[type]", apk_type.name())
                .replace("%[version]", &build.to_string());
            project.base_path.join(path)
        } else {
            let folder = project.release_folder(
                &format!("android_{}", apk_type.name().to_lowercase()),
                None,
            );
            folder.join(format!("{}-{}-{}.apk", project.name, apk_type.name(), build))
        };

        let mut action = BuildAction::new(target, output);
        action.apk_type = Some(apk_type);
        return Ok(action);
    }

    let folder = if release.use_project_output_paths && target.platform() == Platform::Html5 {
        project
            .base_path
            .join(project_output_path(project, release, "html5_settings", "html5", label)?)
    } else {
        project.platform_folder(target.platform(), target.architecture())
    };
    let folder_name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let release_dir = folder.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut action = BuildAction::new(target, folder.clone());
    action.include_files = release
        .include_files
        .iter()
        .map(|file| ResolvedFile {
            source: project.base_path.join(file.source()),
            destination: file.destination().to_path_buf(),
        })
        .collect();

    if target.platform() == Platform::Windows && release.package.installer.is_some() {
        action.installer = Some(release_dir.join(format!("{}-setup.exe", folder_name)));
    }

    if let (Platform::Linux, Some(debian), Some(arch)) = (
        target.platform(),
        &release.package.debian,
        target.architecture(),
    ) {
        let version = project.version.clone().ok_or_else(|| AgkError::MissingField {
            release: label.to_string(),
            field: "version".to_string(),
        })?;
        action.debian_package = Some(release_dir.join(format!(
            "{}_{}_{}.deb",
            debian.package,
            version,
            arch.debian_name()
        )));
    }

    if release.archive {
        action.archive = Some(zip_path(&folder));
    }

    Ok(action)
}

/// The `output_path` from a project settings section, release overrides applied.
fn project_output_path(
    project: &AgkProject,
    release: &ReleaseConfig,
    section: &str,
    prefix: &str,
    label: &str,
) -> Result<String> {
    resolve_setting(project, release, section, "output_path")
        .map(|path| path.trim().to_string())
        .filter(|path| !path.is_empty())
        .ok_or_else(|| AgkError::MissingField {
            release: label.to_string(),
            field: format!("{}.output_path", prefix),
        })
}

fn zip_path(folder: &Path) -> PathBuf {
    let mut name = folder.file_name().unwrap_or_default().to_os_string();
    name.push(".zip");
    folder.with_file_name(name)
}
