//! Individual validation checks over release configs.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{Manifest, ReleaseConfig};
use crate::plan::{project_apk_type, survey_media};
use crate::project::{find_tags, AgkProject};
use crate::types::{Platform, PlatformTarget};

use super::warning::{Diagnostic, ValidationResult};

const CODE: &str = "agkbuild::validate";

fn code(name: &str) -> String {
    format!("{}::{}", CODE, name)
}

/// `project` and `platforms` must be present.
pub fn check_required_fields(release: &ReleaseConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    if release.project.is_none() {
        result.push(
            Diagnostic::error(code("missing-project"), "Missing required field 'project'")
                .with_help("Point `project` at the .agk file, relative to the manifest"),
        );
    }
    if release.platforms.is_empty() {
        result.push(
            Diagnostic::error(code("missing-platforms"), "Missing required field 'platforms'")
                .with_help("e.g. `platforms: [windows-x86, linux-x64]`"),
        );
    }

    result
}

/// Each target may be listed once.
pub fn check_duplicate_platforms(release: &ReleaseConfig) -> ValidationResult {
    let mut result = ValidationResult::new();
    let mut seen: Vec<PlatformTarget> = Vec::new();

    for target in &release.platforms {
        if seen.contains(target) {
            result.push(Diagnostic::error(
                code("duplicate-platform"),
                format!("Platform target '{}' is listed more than once", target),
            ));
        } else {
            seen.push(*target);
        }
    }

    result
}

/// Media entries must compile, literal entries must exist, and no file
/// may be both included and excluded.
pub fn check_media(release: &ReleaseConfig, media_root: &Path) -> ValidationResult {
    let mut result = ValidationResult::new();

    let survey = match survey_media(media_root, &release.media) {
        Ok(survey) => survey,
        Err(e) => {
            result.push(Diagnostic::error(code("invalid-media-pattern"), e.to_string()));
            return result;
        }
    };

    for path in &survey.missing {
        result.push(Diagnostic::error(
            code("missing-media"),
            format!("Media file not found: {}", path.display()),
        ));
    }
    for file in &survey.conflicts {
        result.push(
            Diagnostic::error(
                code("media-overlap"),
                format!("Media file '{}' is both included and excluded", file),
            )
            .with_help("Narrow `media.exclude` or drop the file from `media.include`"),
        );
    }
    for pattern in &survey.unmatched {
        result.push(Diagnostic::warning(
            code("unmatched-media-pattern"),
            format!("Media pattern '{}' matches no file", pattern),
        ));
    }

    result
}

/// Include file destinations must stay inside the output folder and
/// sources must exist.
pub fn check_include_files(release: &ReleaseConfig, project_dir: Option<&Path>) -> ValidationResult {
    let mut result = ValidationResult::new();

    for file in &release.include_files {
        if !file.destination_is_safe() {
            result.push(
                Diagnostic::error(
                    code("unsafe-destination"),
                    format!(
                        "Include file destination '{}' leaves the output folder",
                        file.destination().display()
                    ),
                )
                .with_help("Destinations must be relative and must not contain '..'"),
            );
        }

        if let Some(dir) = project_dir {
            let source = dir.join(file.source());
            if !source.is_file() {
                result.push(Diagnostic::error(
                    code("missing-include-file"),
                    format!("Include file '{}' not found", source.display()),
                ));
            }
        }
    }

    result
}

/// Include tags in main.agc and the release mapping must agree.
pub fn check_include_tags(
    main_source: &str,
    tags: &BTreeMap<String, String>,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    let used = find_tags(main_source);

    for tag in &used {
        if !tags.contains_key(tag) {
            result.push(
                Diagnostic::error(
                    code("missing-tag"),
                    format!("main.agc uses include tag '@@{}' but the release maps no file to it", tag),
                )
                .with_help(format!("Add `include_tags: {{ {}: <file> }}`", tag)),
            );
        }
    }

    for tag in tags.keys() {
        if !used.contains(tag) {
            result.push(Diagnostic::warning(
                code("unused-tag"),
                format!("Include tag '{}' is not used in main.agc", tag),
            ));
        }
    }

    result
}

/// `android` must not resolve to an APK type that is also listed.
pub fn check_android_conflict(release: &ReleaseConfig, project: &AgkProject) -> ValidationResult {
    let mut result = ValidationResult::new();

    if !release.platforms.contains(&PlatformTarget::Android) {
        return result;
    }

    match project_apk_type(project, &release.apk) {
        Ok(apk_type) => {
            let clash = release
                .platforms
                .iter()
                .any(|t| t.apk_type() == Some(apk_type));
            if clash {
                result.push(Diagnostic::error(
                    code("conflicting-platform"),
                    format!(
                        "'android' exports the project's {} APK, which is also listed explicitly",
                        apk_type
                    ),
                ));
            }
        }
        Err(e) => result.push(Diagnostic::error(code("apk-type"), e.to_string())),
    }

    result
}

/// Packaging metadata must be usable and should apply to some target.
pub fn check_packaging(release: &ReleaseConfig, project_dir: Option<&Path>) -> ValidationResult {
    let mut result = ValidationResult::new();
    let has = |platform: Platform| release.platforms.iter().any(|t| t.platform() == platform);

    if let Some(installer) = &release.package.installer {
        if !has(Platform::Windows) {
            result.push(Diagnostic::warning(
                code("unused-installer"),
                "An installer is configured but no Windows target is selected",
            ));
        }
        if let Some(dir) = project_dir {
            if !dir.join(&installer.script).is_file() {
                result.push(Diagnostic::error(
                    code("missing-installer-script"),
                    format!("Installer script '{}' not found", installer.script.display()),
                ));
            }
        }
    }

    if let Some(debian) = &release.package.debian {
        if !has(Platform::Linux) {
            result.push(Diagnostic::warning(
                code("unused-debian"),
                "A Debian package is configured but no Linux target is selected",
            ));
        }
        if !debian.package_name_is_valid() {
            result.push(
                Diagnostic::error(
                    code("debian-package-name"),
                    format!("Invalid Debian package name '{}'", debian.package),
                )
                .with_help("Use lowercase letters, digits, '+', '-' and '.'"),
            );
        }
    }

    result
}

/// Release labels should be unique so summaries are unambiguous.
pub fn check_duplicate_labels(manifest: &Manifest) -> ValidationResult {
    let mut result = ValidationResult::new();
    let mut seen: Vec<String> = Vec::new();

    for release in &manifest.releases {
        let label = release.label();
        if seen.contains(&label) {
            result.push(
                Diagnostic::warning(
                    code("duplicate-release"),
                    format!("More than one release is labelled '{}'", label),
                )
                .with_help("Give each release a distinct `name`"),
            );
        } else {
            seen.push(label);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DebianConfig, IncludeFile, MediaFilter};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn release(platforms: &[PlatformTarget]) -> ReleaseConfig {
        ReleaseConfig {
            project: Some(PathBuf::from("Game.agk")),
            platforms: platforms.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_required_fields() {
        assert!(check_required_fields(&release(&[PlatformTarget::Html5])).is_ok());

        let result = check_required_fields(&ReleaseConfig::default());
        assert_eq!(result.error_count(), 2);
    }

    #[test]
    fn test_duplicate_platforms() {
        let result = check_duplicate_platforms(&release(&[
            PlatformTarget::WindowsX86,
            PlatformTarget::LinuxX86,
            PlatformTarget::WindowsX86,
        ]));
        assert_eq!(result.error_count(), 1);
    }

    fn media_root() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("music")).unwrap();
        fs::write(dir.path().join("music/theme.ogg"), "ogg").unwrap();
        fs::write(dir.path().join("logo.png"), "png").unwrap();
        dir
    }

    #[test]
    fn test_media_overlap_through_pattern() {
        let dir = media_root();
        let mut r = release(&[PlatformTarget::Html5]);
        r.media = MediaFilter {
            include_by_default: false,
            include: vec!["music/theme.ogg".to_string()],
            exclude: vec!["music/*".to_string()],
        };
        let result = check_media(&r, dir.path());
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.first_error().unwrap().code, code("media-overlap"));
    }

    #[test]
    fn test_media_literal_overlap_and_missing() {
        let dir = media_root();
        let mut r = release(&[PlatformTarget::Html5]);
        r.media = MediaFilter {
            include: vec!["logo.png".to_string()],
            exclude: vec!["logo.png".to_string(), "b.png".to_string()],
            ..Default::default()
        };
        let result = check_media(&r, dir.path());
        let codes: Vec<&str> = result.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec![code("missing-media"), code("media-overlap")]);
    }

    #[test]
    fn test_media_unmatched_and_invalid_patterns() {
        let dir = media_root();
        let mut r = release(&[PlatformTarget::Html5]);
        r.media.exclude = vec!["sounds/*.wav".to_string()];
        let result = check_media(&r, dir.path());
        assert_eq!(result.error_count(), 0);
        assert_eq!(result.warning_count(), 1);

        r.media.exclude = vec!["music/[.ogg".to_string()];
        let result = check_media(&r, dir.path());
        assert_eq!(result.first_error().unwrap().code, code("invalid-media-pattern"));
    }

    #[test]
    fn test_include_file_destination() {
        let mut r = release(&[PlatformTarget::Html5]);
        r.include_files = vec![
            IncludeFile::Same(PathBuf::from("readme.txt")),
            IncludeFile::Mapped {
                src: PathBuf::from("a"),
                dst: PathBuf::from("../a"),
            },
        ];
        assert_eq!(check_include_files(&r, None).error_count(), 1);
    }

    #[test]
    fn test_include_tags() {
        let mut tags = BTreeMap::new();
        tags.insert("demo".to_string(), "demo-on.agc".to_string());
        tags.insert("steam".to_string(), "steam.agc".to_string());

        let source = "#insert \"x.agc\" // @@demo\n#insert \"y.agc\" // @@store\n";
        let result = check_include_tags(source, &tags);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warning_count(), 1);
    }

    #[test]
    fn test_packaging_checks() {
        let mut r = release(&[PlatformTarget::WindowsX86]);
        r.package.debian = Some(DebianConfig {
            package: "Bad Name".to_string(),
            maintainer: "dev".to_string(),
            section: "games".to_string(),
            priority: "optional".to_string(),
            depends: vec![],
            dpkg_deb: PathBuf::from("dpkg-deb"),
        });
        let result = check_packaging(&r, None);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warning_count(), 1);
    }

    #[test]
    fn test_duplicate_labels() {
        let manifest = Manifest {
            releases: vec![release(&[PlatformTarget::Html5]), release(&[PlatformTarget::Html5])],
            ..Default::default()
        };
        assert_eq!(check_duplicate_labels(&manifest).warning_count(), 1);
    }
}
