//! Android APK export.
//!
//! The AGK player sources for the chosen flavour are copied into the
//! project's `build_tmp/` folder, where the manifest, string resources
//! and icons are generated. aapt2 compiles and links the resources into
//! an unsigned package; the player binaries, assets and media are then
//! appended before the package is signed with jarsigner and aligned with
//! zipalign.

mod aapt2;
mod icons;
mod manifest;
mod settings;
mod values;

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{AgkError, Result};
use crate::plan::ReleasePlan;
use crate::toolchain::{AndroidTools, Invocation};
use crate::types::{ApkType, BuildAction};

use super::archive::append_files;
use super::files::{copy_file, copy_tree, read_text, write_text, ScratchDir};
use super::Exporter;

pub use aapt2::{check_output, Aapt2Batch};
pub use icons::{check_ouya_icon, icon_jobs, render_icon};
pub use manifest::render_manifest;
pub use settings::{ApkSettings, ArCore, Orientation, Permissions, Signing};
pub use values::{patch_values, FirebaseIds};

/// ABIs the player ships native libraries for.
const ABIS: [&str; 3] = ["arm64-v8a", "armeabi-v7a", "x86"];

const VALUES_XML: &str = "resOrig/values/values.xml";
const OUYA_LARGE_ICON: &str = "resOrig/drawable-xhdpi-v4/ouya_icon.png";

fn read_firebase(settings: &ApkSettings) -> Result<Option<FirebaseIds>> {
    let Some(path) = settings.firebase_config.as_ref().filter(|_| settings.include_firebase()) else {
        return Ok(None);
    };
    let raw = read_text(path)?;
    let config: serde_json::Value = serde_json::from_str(&raw).map_err(|e| AgkError::Parse {
        message: format!("{}: {}", path.display(), e),
        help: Some("The Firebase config file must be valid JSON".to_string()),
    })?;
    FirebaseIds::from_json(&config, &settings.package_name).map(Some)
}

/// Generate manifest, values and icons in `scratch`. Returns the resources
/// to compile, relative to `scratch`.
fn prepare_resources(settings: &ApkSettings, scratch: &Path) -> Result<Vec<PathBuf>> {
    let manifest_path = scratch.join("AndroidManifest.xml");
    let template = read_text(&manifest_path)?;
    write_text(&manifest_path, &render_manifest(settings, &template))?;

    let firebase = read_firebase(settings)?;
    let values_path = scratch.join(VALUES_XML);
    let contents = read_text(&values_path)?;
    write_text(&values_path, &patch_values(settings, &contents, firebase.as_ref())?)?;

    let mut resources = vec![PathBuf::from(VALUES_XML)];
    for job in icon_jobs(settings) {
        resources.push(render_icon(&job, scratch)?);
    }

    if settings.apk_type == ApkType::Ouya {
        if let Some(icon) = &settings.ouya_icon {
            check_ouya_icon(icon)?;
            copy_file(icon, &scratch.join(OUYA_LARGE_ICON))?;
            resources.push(PathBuf::from(OUYA_LARGE_ICON));
        }
    }
    Ok(resources)
}

fn compiled_resources(scratch: &Path) -> Result<Vec<PathBuf>> {
    let merged = scratch.join("resMerged");
    let mut files = Vec::new();
    if !merged.is_dir() {
        return Ok(files);
    }
    for entry in WalkDir::new(&merged).sort_by_file_name() {
        let entry = entry.map_err(|e| AgkError::io(&merged, format!("Failed to scan folder: {}", e)))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Entries appended to the linked package, as (source, name in zip).
fn package_entries(
    settings: &ApkSettings,
    tools: &AndroidTools,
    plan: &ReleasePlan,
) -> Result<Vec<(PathBuf, String)>> {
    let source = tools.source_folder(settings.apk_type);
    let mut entries = vec![(source.join("classes.dex"), "classes.dex".to_string())];

    let mut libs = vec!["libandroid_player.so"];
    if settings.arcore != ArCore::None {
        libs.push("libarcore_sdk.so");
    }
    for lib in libs {
        for abi in ABIS {
            entries.push((tools.lib_dir().join(abi).join(lib), format!("lib/{}/{}", abi, lib)));
        }
    }

    if settings.apk_type != ApkType::Ouya {
        let assets = tools.assets_dir();
        for entry in WalkDir::new(&assets).sort_by_file_name() {
            let entry = entry.map_err(|e| AgkError::io(&assets, format!("Failed to scan folder: {}", e)))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&assets).unwrap_or(entry.path());
            let name = format!("assets/{}", relative.to_string_lossy().replace('\\', "/"));
            entries.push((entry.into_path(), name));
        }
    }

    for file in &plan.media.files {
        entries.push((file.path.clone(), format!("assets/media/{}", file.relative)));
    }
    Ok(entries)
}

fn sign_and_align(
    ex: &mut Exporter,
    tools: &AndroidTools,
    settings: &ApkSettings,
    scratch: &Path,
    unsigned: &Path,
    output: &Path,
) -> Result<()> {
    let signing = settings.signing(&tools.debug_keystore);
    let jarsigner = Invocation::new(&tools.jarsigner)
        .args(["-sigalg", "MD5withRSA", "-digestalg", "SHA1"])
        .arg("-storepass")
        .arg(&signing.keystore_password)
        .arg("-keystore")
        .arg(&signing.keystore)
        .arg(unsigned)
        .arg(&signing.alias)
        .arg("-keypass")
        .arg(&signing.alias_password)
        .cwd(scratch);
    ex.run(jarsigner)?.check_silent("jarsigner")?;

    let zipalign = Invocation::new(&tools.zipalign)
        .arg("4")
        .arg(unsigned)
        .arg(output)
        .cwd(scratch);
    ex.run(zipalign)?.check_silent("zipalign")?;
    Ok(())
}

pub(super) fn export(ex: &mut Exporter, plan: &ReleasePlan, action: &BuildAction) -> Result<()> {
    let apk_type = action.apk_type.ok_or_else(|| AgkError::Build {
        message: format!("Target '{}' has no APK type", action.target),
        help: None,
    })?;
    let settings = ApkSettings::resolve(plan, apk_type, &ex.secrets)?;
    settings.validate()?;
    let tools = ex.toolchain.android_tools()?;

    let output = &action.output;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AgkError::io(parent, format!("Failed to create folder: {}", e)))?;
    }
    if output.exists() {
        fs::remove_file(output)
            .map_err(|e| AgkError::io(output, format!("Failed to remove old package: {}", e)))?;
    }

    let scratch = ScratchDir::create(plan.project.temp_path())?;
    let dir = scratch.path();
    copy_tree(&tools.source_folder(apk_type), dir, &[])?;
    let resources = prepare_resources(&settings, dir)?;

    let mut compile = Aapt2Batch::new();
    for resource in &resources {
        compile.compile(resource);
    }
    let run = Invocation::new(&tools.aapt2).arg("m").cwd(dir).stdin(compile.finish());
    check_output(&ex.run(run)?)?;

    let mut link = Aapt2Batch::new();
    link.link(
        &tools.android_jar,
        &dir.join("AndroidManifest.xml"),
        output,
        &compiled_resources(dir)?,
    );
    let run = Invocation::new(&tools.aapt2).arg("m").cwd(dir).stdin(link.finish());
    check_output(&ex.run(run)?)?;

    if !output.is_file() {
        return Err(AgkError::Build {
            message: format!("aapt2 did not write {}", output.display()),
            help: Some("Check that the project folder is not write protected".to_string()),
        });
    }

    let unsigned = output.with_extension("zip");
    fs::rename(output, &unsigned)
        .map_err(|e| AgkError::io(output, format!("Failed to rename package: {}", e)))?;

    let result = append_files(&unsigned, &package_entries(&settings, &tools, plan)?)
        .and_then(|_| sign_and_align(ex, &tools, &settings, dir, &unsigned, output));
    let _ = fs::remove_file(&unsigned);
    result
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{fake_install, sample_project, RecordingRunner};
    use super::*;
    use crate::output::{Printer, Verbosity};
    use crate::plan::resolve_release;
    use crate::toolchain::{ToolOutput, Toolchain};
    use crate::types::PlatformTarget;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn zip_names(path: &Path) -> Vec<String> {
        let file = fs::File::open(path).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_google_apk_export() {
        let agk = tempdir().unwrap();
        fake_install(agk.path());
        let project = tempdir().unwrap();
        let mut release = sample_project(project.path(), &[PlatformTarget::GoogleApk]);
        RgbaImage::from_pixel(256, 256, Rgba([0, 0, 255, 255]))
            .save(project.path().join("icon.png"))
            .unwrap();
        release.apk.insert("app_icon_path".to_string(), "icon.png".to_string());
        release.apk.insert("arcore".to_string(), "1".to_string());

        let plan = resolve_release(&release, project.path()).unwrap();
        let toolchain = Toolchain::at(agk.path()).unwrap();
        let mut runner = RecordingRunner::default();
        let printer = Printer::new().with_verbosity(Verbosity::Quiet);
        let mut ex = Exporter::new(&toolchain, &mut runner, &printer);

        let action = &plan.actions[0];
        export(&mut ex, &plan, action).unwrap();

        // The fake zipalign copies the signed zip to the output path.
        let names = zip_names(&action.output);
        assert!(names.contains(&"classes.dex".to_string()));
        assert!(names.contains(&"lib/x86/libandroid_player.so".to_string()));
        assert!(names.contains(&"lib/arm64-v8a/libarcore_sdk.so".to_string()));
        assert!(names.contains(&"assets/media/logo.png".to_string()));
        assert!(names.contains(&"assets/media/sounds/jump.wav".to_string()));
        assert!(names.iter().any(|n| n.starts_with("assets/") && !n.starts_with("assets/media/")));
        assert!(!action.output.with_extension("zip").exists());
        assert!(!plan.project.temp_path().exists());

        let programs: Vec<String> = runner.calls.iter().map(|c| c.tool_name()).collect();
        assert_eq!(programs, vec!["aapt2", "aapt2", "jarsigner", "zipalign"]);

        let compile = runner.calls[0].stdin.as_deref().unwrap();
        assert!(compile.starts_with("compile\n-o\nresMerged\nresOrig/values/values.xml\n\n"));
        assert!(compile.contains("resOrig/drawable-xxxhdpi/icon.png"));
        assert!(compile.ends_with("quit\n\n"));

        let jarsigner = &runner.calls[2];
        assert!(jarsigner.args.contains(&"androiddebugkey".to_string()));
        assert!(jarsigner.display_args().contains("-storepass ****"));
    }

    #[test]
    fn test_link_lists_compiled_resources() {
        let agk = tempdir().unwrap();
        fake_install(agk.path());
        let project = tempdir().unwrap();
        let release = sample_project(project.path(), &[PlatformTarget::AmazonApk]);

        let plan = resolve_release(&release, project.path()).unwrap();
        let toolchain = Toolchain::at(agk.path()).unwrap();
        let mut runner = RecordingRunner::default();
        let printer = Printer::new().with_verbosity(Verbosity::Quiet);
        let mut ex = Exporter::new(&toolchain, &mut runner, &printer);
        export(&mut ex, &plan, &plan.actions[0]).unwrap();

        let link = runner.calls[1].stdin.as_deref().unwrap();
        assert!(link.starts_with("l\n-I\n"));
        assert!(link.contains("values_values.arsc.flat"));
    }

    #[test]
    fn test_missing_linked_package_fails() {
        let agk = tempdir().unwrap();
        fake_install(agk.path());
        let project = tempdir().unwrap();
        let release = sample_project(project.path(), &[PlatformTarget::GoogleApk]);

        let plan = resolve_release(&release, project.path()).unwrap();
        let toolchain = Toolchain::at(agk.path()).unwrap();
        let mut runner = RecordingRunner::with_responder(|_| ToolOutput {
            code: Some(0),
            stdout: String::new(),
            stderr: "Done\n".to_string(),
        });
        let printer = Printer::new().with_verbosity(Verbosity::Quiet);
        let mut ex = Exporter::new(&toolchain, &mut runner, &printer);

        let err = export(&mut ex, &plan, &plan.actions[0]).unwrap_err();
        assert!(matches!(err, AgkError::Build { .. }));
        assert!(!plan.project.temp_path().exists());
    }

    #[test]
    fn test_jarsigner_output_is_failure() {
        let agk = tempdir().unwrap();
        fake_install(agk.path());
        let project = tempdir().unwrap();
        let release = sample_project(project.path(), &[PlatformTarget::GoogleApk]);

        let plan = resolve_release(&release, project.path()).unwrap();
        let toolchain = Toolchain::at(agk.path()).unwrap();
        let mut runner = RecordingRunner::default().fail_tool("jarsigner", "keystore was tampered with");
        let printer = Printer::new().with_verbosity(Verbosity::Quiet);
        let mut ex = Exporter::new(&toolchain, &mut runner, &printer);

        let action = &plan.actions[0];
        let err = export(&mut ex, &plan, action).unwrap_err();
        assert!(err.to_string().contains("tampered"));
        assert!(!action.output.with_extension("zip").exists());
        assert!(!action.output.exists());
    }
}
