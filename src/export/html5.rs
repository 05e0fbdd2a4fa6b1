//! HTML5 export.
//!
//! The media manifest is packed into `AGKPlayer.data` back to back, and
//! `AGKPlayer.js` is patched with the matching `loadPackage` descriptor
//! and the folders the player must create before loading it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{AgkError, Result};
use crate::plan::{MediaManifest, ReleasePlan};
use crate::types::BuildAction;

use super::files::{copy_file, read_text, reset_dir, write_text};
use super::Exporter;

const PACKAGE_UUID: &str = "e3c8dd30-b68a-4332-8c93-d0cf8f9d28a0";
const FOLDERS_PLACEHOLDER: &str = "%%ADDITIONALFOLDERS%%";
const PACKAGE_PLACEHOLDER: &str = "%%LOADPACKAGE%%";
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "wav", "ogg"];

/// Player files copied unchanged from the template.
const PLAYER_FILES: &[&str] = &[
    "AGKPlayer.asm.js",
    "AGKPlayer.html.mem",
    "background.jpg",
    "made-with-appgamekit.png",
];

/// One file inside `AGKPlayer.data`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PackageEntry {
    filename: String,
    start: u64,
    end: u64,
    audio: bool,
}

/// The media packed for the HTML5 player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Html5Package {
    entries: Vec<PackageEntry>,
    folders: Vec<String>,
    size: u64,
}

impl Html5Package {
    /// Append every manifest file to `data`, recording its byte range.
    pub fn write(media: &MediaManifest, data: &mut impl Write) -> Result<Self> {
        let mut package = Html5Package {
            folders: media.directories(),
            ..Default::default()
        };

        for file in &media.files {
            let bytes = std::fs::read(&file.path)
                .map_err(|e| AgkError::io(&file.path, format!("Failed to read media: {}", e)))?;
            data.write_all(&bytes)
                .map_err(|e| AgkError::io(&file.path, format!("Failed to pack media: {}", e)))?;

            let audio = Path::new(&file.relative)
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .is_some_and(|e| AUDIO_EXTENSIONS.contains(&e.as_str()));
            let start = package.size;
            package.size += bytes.len() as u64;
            package.entries.push(PackageEntry {
                filename: format!("/media/{}", file.relative),
                start,
                end: package.size,
                audio,
            });
        }

        Ok(package)
    }

    /// Total size of `AGKPlayer.data`.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// `Module["FS_createPath"]` calls for `/media` and every subfolder,
    /// parents first.
    pub fn folders_script(&self) -> String {
        let mut script = String::from(r#"Module["FS_createPath"]("/", "media", true, true);"#);
        for folder in &self.folders {
            let (parent, name) = match folder.rsplit_once('/') {
                Some((parent, name)) => (format!("/media/{}", parent), name),
                None => ("/media".to_string(), folder.as_str()),
            };
            script.push_str(&format!(
                r#"Module["FS_createPath"]({}, {}, true, true);"#,
                json_string(&parent),
                json_string(name)
            ));
        }
        script
    }

    /// The `loadPackage({...})` call describing the data file.
    pub fn load_package_script(&self) -> String {
        let files: Vec<String> = self
            .entries
            .iter()
            .map(|e| {
                format!(
                    r#"{{"audio":{},"start":{},"crunched":0,"end":{},"filename":{}}}"#,
                    u8::from(e.audio),
                    e.start,
                    e.end,
                    json_string(&e.filename)
                )
            })
            .collect();
        format!(
            r#"loadPackage({{"files":[{}],"remote_package_size":{},"package_uuid":"{}"}})"#,
            files.join(","),
            self.size,
            PACKAGE_UUID
        )
    }
}

fn json_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Substitute both placeholders in `AGKPlayer.js`. A template missing
/// either one is corrupt.
pub fn patch_player_js(contents: &str, folders: &str, load_package: &str) -> Result<String> {
    for placeholder in [FOLDERS_PLACEHOLDER, PACKAGE_PLACEHOLDER] {
        if !contents.contains(placeholder) {
            return Err(AgkError::Build {
                message: format!("AGKPlayer.js is corrupt, it is missing {}", placeholder),
                help: Some("Reinstall AppGameKit Classic or repair its html5 folder".to_string()),
            });
        }
    }
    Ok(contents
        .replace(FOLDERS_PLACEHOLDER, folders)
        .replace(PACKAGE_PLACEHOLDER, load_package))
}

/// Player template folder for the project's command set.
fn template_folder(plan: &ReleasePlan) -> Result<&'static str> {
    let int_setting = |key: &str| -> Result<i64> {
        match plan.setting("html5_settings", key) {
            None => Ok(0),
            Some(raw) if raw.trim().is_empty() => Ok(0),
            Some(raw) => raw.trim().parse().map_err(|_| AgkError::Config {
                message: format!("HTML5 setting {} '{}' is not a number", key, raw),
                help: None,
            }),
        }
    };

    let dynamic = int_setting("dynamic_memory")? != 0;
    match (int_setting("commands_used")?, dynamic) {
        (0, false) => Ok("2D"),
        (0, true) => Ok("2Ddynamic"),
        (1, false) => Ok("3D"),
        (1, true) => Ok("3Ddynamic"),
        (other, _) => Err(AgkError::Config {
            message: format!("Unrecognised HTML5 commands_used value {}", other),
            help: Some("Use 0 (2D only) or 1 (2D and 3D)".to_string()),
        }),
    }
}

pub(super) fn export(ex: &mut Exporter, plan: &ReleasePlan, action: &BuildAction) -> Result<()> {
    let template = ex.toolchain.html5_template(template_folder(plan)?);
    let folder = &action.output;
    reset_dir(folder)?;

    let data_path = folder.join("AGKPlayer.data");
    let data = File::create(&data_path)
        .map_err(|e| AgkError::io(&data_path, format!("Failed to create file: {}", e)))?;
    let mut data = BufWriter::new(data);
    let package = Html5Package::write(&plan.media, &mut data)?;
    data.flush()
        .map_err(|e| AgkError::io(&data_path, format!("Failed to write file: {}", e)))?;

    let player_js = read_text(&template.join("AGKPlayer.js"))?;
    let player_js = patch_player_js(
        &player_js,
        &package.folders_script(),
        &package.load_package_script(),
    )?;
    write_text(&folder.join("AGKPlayer.js"), &player_js)?;

    for name in PLAYER_FILES {
        copy_file(&template.join(name), &folder.join(name))?;
    }

    let page = format!("{}.html", plan.project.name.replace(' ', "_"));
    copy_file(&template.join("AGKPlayer.html"), &folder.join(page))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{fake_install, sample_project, RecordingRunner};
    use super::*;
    use crate::config::MediaFilter;
    use crate::output::{Printer, Verbosity};
    use crate::plan::{resolve_release, scan_media};
    use crate::toolchain::Toolchain;
    use crate::types::PlatformTarget;
    use std::fs;
    use tempfile::tempdir;

    fn packed(media: &Path) -> (Html5Package, Vec<u8>) {
        let manifest = scan_media(media, &MediaFilter::default()).unwrap();
        let mut data = Vec::new();
        let package = Html5Package::write(&manifest, &mut data).unwrap();
        (package, data)
    }

    #[test]
    fn test_package_ranges_are_contiguous() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sounds")).unwrap();
        fs::write(dir.path().join("logo.png"), "12345").unwrap();
        fs::write(dir.path().join("sounds/jump.WAV"), "abc").unwrap();

        let (package, data) = packed(dir.path());
        assert_eq!(package.size(), 8);
        assert_eq!(data, b"12345abc");

        insta::assert_snapshot!(package.load_package_script(), @r#"loadPackage({"files":[{"audio":0,"start":0,"crunched":0,"end":5,"filename":"/media/logo.png"},{"audio":1,"start":5,"crunched":0,"end":8,"filename":"/media/sounds/jump.WAV"}],"remote_package_size":8,"package_uuid":"e3c8dd30-b68a-4332-8c93-d0cf8f9d28a0"})"#);
    }

    #[test]
    fn test_folders_script_lists_nested_folders() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("levels/world1")).unwrap();
        fs::write(dir.path().join("levels/world1/map.txt"), "m").unwrap();

        let (package, _) = packed(dir.path());
        assert_eq!(
            package.folders_script(),
            concat!(
                r#"Module["FS_createPath"]("/", "media", true, true);"#,
                r#"Module["FS_createPath"]("/media", "levels", true, true);"#,
                r#"Module["FS_createPath"]("/media/levels", "world1", true, true);"#,
            )
        );
    }

    #[test]
    fn test_empty_media_descriptor() {
        let dir = tempdir().unwrap();
        let (package, data) = packed(&dir.path().join("missing"));
        assert!(data.is_empty());
        assert_eq!(
            package.load_package_script(),
            r#"loadPackage({"files":[],"remote_package_size":0,"package_uuid":"e3c8dd30-b68a-4332-8c93-d0cf8f9d28a0"})"#
        );
    }

    #[test]
    fn test_patch_requires_both_placeholders() {
        let patched = patch_player_js("a %%ADDITIONALFOLDERS%% b %%LOADPACKAGE%%", "F", "L").unwrap();
        assert_eq!(patched, "a F b L");

        let err = patch_player_js("only %%LOADPACKAGE%%", "F", "L").unwrap_err();
        assert!(err.to_string().contains("%%ADDITIONALFOLDERS%%"));
    }

    #[test]
    fn test_html5_export_layout() {
        let agk = tempdir().unwrap();
        fake_install(agk.path());
        let project = tempdir().unwrap();
        let mut release = sample_project(project.path(), &[PlatformTarget::Html5]);
        release.project_name = Some("My Game".to_string());
        release.html5.insert("commands_used".to_string(), "1".to_string());

        let plan = resolve_release(&release, project.path()).unwrap();
        let toolchain = Toolchain::at(agk.path()).unwrap();
        let mut runner = RecordingRunner::default();
        let printer = Printer::new().with_verbosity(Verbosity::Quiet);
        let mut ex = Exporter::new(&toolchain, &mut runner, &printer);

        let action = &plan.actions[0];
        export(&mut ex, &plan, action).unwrap();

        let out = &action.output;
        for name in PLAYER_FILES {
            assert!(out.join(name).is_file(), "{}", name);
        }
        assert_eq!(fs::read_to_string(out.join("My_Game.html")).unwrap(), "3D page");
        let js = fs::read_to_string(out.join("AGKPlayer.js")).unwrap();
        assert!(js.contains("loadPackage("));
        assert!(js.contains(r#""filename":"/media/logo.png""#));
        assert!(!js.contains("%%"));
    }

    #[test]
    fn test_unknown_command_set() {
        let project = tempdir().unwrap();
        let mut release = sample_project(project.path(), &[PlatformTarget::Html5]);
        release.html5.insert("commands_used".to_string(), "4".to_string());
        let plan = resolve_release(&release, project.path()).unwrap();
        assert!(matches!(template_folder(&plan), Err(AgkError::Config { .. })));
    }
}
