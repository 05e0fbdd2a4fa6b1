//! Media manifest: the files of a project's `media/` folder that ship
//! with a release.
//!
//! The project's media folder is never modified. Exports copy exactly
//! the files listed in the manifest.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::config::{is_pattern, normalize_entry, MediaFilter};
use crate::error::{AgkError, Result};
use crate::project::IGNORE_FILES;

/// A media file and its `/`-separated path relative to `media/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFile {
    pub relative: String,
    pub path: PathBuf,
}

/// Result of filtering a media folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MediaManifest {
    /// The scanned media folder.
    pub root: PathBuf,
    /// Files that ship, sorted by relative path.
    pub files: Vec<MediaFile>,
    /// Files left out, sorted by relative path.
    pub excluded: Vec<String>,
}

impl MediaManifest {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Folders that contain shipped files, parents before children.
    pub fn directories(&self) -> Vec<String> {
        let mut dirs: Vec<String> = Vec::new();
        for file in &self.files {
            let mut current = file.relative.as_str();
            while let Some((parent, _)) = current.rsplit_once('/') {
                if !dirs.iter().any(|d| d == parent) {
                    dirs.push(parent.to_string());
                }
                current = parent;
            }
        }
        dirs.sort();
        dirs
    }

    pub fn contains(&self, relative: &str) -> bool {
        self.files.iter().any(|f| f.relative == relative)
    }
}

/// Everything a scan found out about a media folder and its filter.
#[derive(Debug, Clone, Default)]
pub struct MediaSurvey {
    pub manifest: MediaManifest,
    /// Literal entries naming files that do not exist.
    pub missing: Vec<PathBuf>,
    /// Files matched by both an include and an exclude entry.
    pub conflicts: Vec<String>,
    /// Pattern entries that matched no file.
    pub unmatched: Vec<String>,
}

/// Walk `root` and classify every file against `filter`.
pub fn survey_media(root: &Path, filter: &MediaFilter) -> Result<MediaSurvey> {
    let matcher = filter.compile()?;
    let mut survey = MediaSurvey {
        manifest: MediaManifest {
            root: root.to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    };

    for entry in filter.include.iter().chain(&filter.exclude) {
        let path = root.join(normalize_entry(entry));
        if !is_pattern(entry) && !path.is_file() {
            survey.missing.push(path);
        }
    }

    let mut include_used = vec![false; filter.include.len()];
    let mut exclude_used = vec![false; filter.exclude.len()];

    if root.exists() {
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| AgkError::Io {
                path: root.to_path_buf(),
                message: format!("Failed to scan media: {}", e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if IGNORE_FILES.contains(&name.as_ref()) {
                continue;
            }

            let relative = relative_path(root, entry.path());
            let included = matcher.include_matches(&relative);
            let excluded = matcher.exclude_matches(&relative);
            included.iter().for_each(|i| include_used[*i] = true);
            excluded.iter().for_each(|i| exclude_used[*i] = true);

            if !included.is_empty() && !excluded.is_empty() {
                survey.conflicts.push(relative.clone());
            }
            if matcher.allows(&relative) {
                survey.manifest.files.push(MediaFile {
                    relative,
                    path: entry.path().to_path_buf(),
                });
            } else {
                survey.manifest.excluded.push(relative);
            }
        }
    }

    let entries = filter.include.iter().zip(&include_used);
    survey.unmatched = entries
        .chain(filter.exclude.iter().zip(&exclude_used))
        .filter(|(entry, used)| !**used && is_pattern(entry))
        .map(|(entry, _)| entry.clone())
        .collect();

    survey.manifest.files.sort_by(|a, b| a.relative.cmp(&b.relative));
    survey.manifest.excluded.sort();
    survey.conflicts.sort();
    Ok(survey)
}

/// Scan `root` and partition its files with `filter`.
///
/// Literal include and exclude entries must name existing files, and no
/// file may be matched by both lists.
pub fn scan_media(root: &Path, filter: &MediaFilter) -> Result<MediaManifest> {
    let survey = survey_media(root, filter)?;

    if let Some(path) = survey.missing.into_iter().next() {
        return Err(AgkError::MediaNotFound { path });
    }
    if !survey.conflicts.is_empty() {
        return Err(AgkError::Validation {
            message: format!(
                "Media both included and excluded: {}",
                survey.conflicts.join(", ")
            ),
            help: Some("Narrow `media.exclude` or drop the file from `media.include`".to_string()),
        });
    }
    Ok(survey.manifest)
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn media_dir() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sounds")).unwrap();
        fs::create_dir_all(root.join("levels/full")).unwrap();
        fs::write(root.join("logo.png"), "png").unwrap();
        fs::write(root.join("Thumbs.db"), "junk").unwrap();
        fs::write(root.join("sounds/jump.wav"), "wav").unwrap();
        fs::write(root.join("sounds/theme.ogg"), "ogg").unwrap();
        fs::write(root.join("levels/1.json"), "{}").unwrap();
        fs::write(root.join("levels/full/2.json"), "{}").unwrap();
        dir
    }

    fn relatives(manifest: &MediaManifest) -> Vec<&str> {
        manifest.files.iter().map(|f| f.relative.as_str()).collect()
    }

    #[test]
    fn test_default_filter_ships_everything_but_ignored() {
        let dir = media_dir();
        let manifest = scan_media(dir.path(), &MediaFilter::default()).unwrap();

        assert_eq!(
            relatives(&manifest),
            vec![
                "levels/1.json",
                "levels/full/2.json",
                "logo.png",
                "sounds/jump.wav",
                "sounds/theme.ogg"
            ]
        );
        assert!(manifest.excluded.is_empty());
    }

    #[test]
    fn test_exclude_partitions_files() {
        let dir = media_dir();
        let filter = MediaFilter {
            exclude: vec!["levels/full/*".to_string(), "sounds/jump.wav".to_string()],
            ..Default::default()
        };
        let manifest = scan_media(dir.path(), &filter).unwrap();

        assert_eq!(
            relatives(&manifest),
            vec!["levels/1.json", "logo.png", "sounds/theme.ogg"]
        );
        assert_eq!(manifest.excluded, vec!["levels/full/2.json", "sounds/jump.wav"]);
        assert_eq!(manifest.len() + manifest.excluded.len(), 5);
    }

    #[test]
    fn test_include_only_mode() {
        let dir = media_dir();
        let filter = MediaFilter {
            include_by_default: false,
            include: vec!["sounds/*".to_string(), "logo.png".to_string()],
            exclude: vec!["levels/*".to_string()],
        };
        let manifest = scan_media(dir.path(), &filter).unwrap();

        assert_eq!(
            relatives(&manifest),
            vec!["logo.png", "sounds/jump.wav", "sounds/theme.ogg"]
        );
    }

    #[test]
    fn test_missing_literal_entry() {
        let dir = media_dir();
        let filter = MediaFilter {
            exclude: vec!["sounds/missing.wav".to_string()],
            ..Default::default()
        };
        let err = scan_media(dir.path(), &filter).unwrap_err();
        assert!(matches!(err, AgkError::MediaNotFound { .. }));
    }

    #[test]
    fn test_exclude_glob_within_folder() {
        let dir = media_dir();
        let filter = MediaFilter {
            exclude: vec!["sounds/*.wav".to_string()],
            ..Default::default()
        };
        let manifest = scan_media(dir.path(), &filter).unwrap();

        assert!(!manifest.contains("sounds/jump.wav"));
        assert!(manifest.contains("sounds/theme.ogg"));
        assert_eq!(manifest.excluded, vec!["sounds/jump.wav"]);
    }

    #[test]
    fn test_file_both_included_and_excluded() {
        let dir = media_dir();
        let filter = MediaFilter {
            include_by_default: false,
            include: vec!["sounds/theme.ogg".to_string()],
            exclude: vec!["sounds/*".to_string()],
        };
        let err = scan_media(dir.path(), &filter).unwrap_err();
        assert!(matches!(err, AgkError::Validation { .. }));
        assert!(err.to_string().contains("sounds/theme.ogg"));

        let survey = survey_media(dir.path(), &filter).unwrap();
        assert_eq!(survey.conflicts, vec!["sounds/theme.ogg"]);
    }

    #[test]
    fn test_survey_reports_unmatched_patterns() {
        let dir = media_dir();
        let filter = MediaFilter {
            exclude: vec!["sound/*.wav".to_string(), "*.json".to_string()],
            ..Default::default()
        };
        let survey = survey_media(dir.path(), &filter).unwrap();

        assert_eq!(survey.unmatched, vec!["sound/*.wav"]);
        assert!(survey.missing.is_empty());
        assert!(survey.conflicts.is_empty());
        assert_eq!(survey.manifest.excluded, vec!["levels/1.json", "levels/full/2.json"]);
    }

    #[test]
    fn test_missing_media_folder_is_empty() {
        let dir = tempdir().unwrap();
        let manifest = scan_media(&dir.path().join("media"), &MediaFilter::default()).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_directories() {
        let dir = media_dir();
        let manifest = scan_media(dir.path(), &MediaFilter::default()).unwrap();
        assert_eq!(manifest.directories(), vec!["levels", "levels/full", "sounds"]);
    }

    #[test]
    fn test_scan_is_deterministic() {
        let dir = media_dir();
        let a = scan_media(dir.path(), &MediaFilter::default()).unwrap();
        let b = scan_media(dir.path(), &MediaFilter::default()).unwrap();
        assert_eq!(a, b);
    }
}
