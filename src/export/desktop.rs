//! Windows and Linux exports: the AGK player renamed after the project,
//! the media manifest and the project's plugins.

use crate::error::{AgkError, Result};
use crate::plan::ReleasePlan;
use crate::types::{Architecture, BuildAction};

use super::files::{copy_file, copy_media, copy_tree, has_entries, make_executable, reset_dir};
use super::Exporter;

fn architecture(action: &BuildAction) -> Result<Architecture> {
    action.architecture.ok_or_else(|| AgkError::Build {
        message: format!("Target '{}' has no architecture", action.target),
        help: None,
    })
}

pub(super) fn export_windows(ex: &mut Exporter, plan: &ReleasePlan, action: &BuildAction) -> Result<()> {
    let arch = architecture(action)?;
    let folder = &action.output;
    reset_dir(folder)?;

    let (player, other_dll) = match arch {
        Architecture::X86 => ("Windows.exe", "Windows64.dll"),
        Architecture::X64 => ("Windows64.exe", "Windows.dll"),
    };
    copy_file(
        &ex.toolchain.windows_players().join(player),
        &folder.join(format!("{}.exe", plan.project.name)),
    )?;

    copy_media(&plan.media, &folder.join("media"))?;

    let plugins = plan.project.plugins_path();
    if has_entries(&plugins) {
        copy_tree(&plugins, &folder.join("Plugins"), &["*.so", "*.dylib", other_dll])?;
    }
    Ok(())
}

pub(super) fn export_linux(ex: &mut Exporter, plan: &ReleasePlan, action: &BuildAction) -> Result<()> {
    let arch = architecture(action)?;
    let folder = &action.output;
    reset_dir(folder)?;

    let binary = folder.join(format!("{}{}", plan.project.clean_name(), arch.bits()));
    copy_file(
        &ex.toolchain
            .linux_players()
            .join(format!("LinuxPlayer{}", arch.bits())),
        &binary,
    )?;
    make_executable(&binary)?;

    copy_media(&plan.media, &folder.join("media"))?;

    let plugins = plan.project.plugins_path();
    if has_entries(&plugins) {
        copy_tree(&plugins, &folder.join("Plugins"), &["*.dll", "*.dylib"])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{fake_install, sample_project, RecordingRunner};
    use super::*;
    use crate::output::{Printer, Verbosity};
    use crate::plan::resolve_release;
    use crate::toolchain::Toolchain;
    use crate::types::PlatformTarget;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_windows_export_layout() {
        let agk = tempdir().unwrap();
        fake_install(agk.path());
        let project = tempdir().unwrap();
        let release = sample_project(project.path(), &[PlatformTarget::WindowsX64]);
        fs::create_dir_all(project.path().join("Plugins/Steam")).unwrap();
        fs::write(project.path().join("Plugins/Steam/Windows.dll"), "32").unwrap();
        fs::write(project.path().join("Plugins/Steam/Windows64.dll"), "64").unwrap();

        let plan = resolve_release(&release, project.path()).unwrap();
        let toolchain = Toolchain::at(agk.path()).unwrap();
        let mut runner = RecordingRunner::default();
        let printer = Printer::new().with_verbosity(Verbosity::Quiet);
        let mut ex = Exporter::new(&toolchain, &mut runner, &printer);

        let action = &plan.actions[0];
        export_windows(&mut ex, &plan, action).unwrap();

        let out = &action.output;
        assert_eq!(fs::read_to_string(out.join("MyGame.exe")).unwrap(), "win64");
        assert!(out.join("media/logo.png").is_file());
        assert!(out.join("Plugins/Steam/Windows64.dll").is_file());
        assert!(!out.join("Plugins/Steam/Windows.dll").exists());
        assert!(runner.calls.is_empty());
    }

    #[test]
    fn test_linux_export_uses_clean_name() {
        let agk = tempdir().unwrap();
        fake_install(agk.path());
        let project = tempdir().unwrap();
        let mut release = sample_project(project.path(), &[PlatformTarget::LinuxX86]);
        release.project_name = Some("My Game!".to_string());

        let plan = resolve_release(&release, project.path()).unwrap();
        let toolchain = Toolchain::at(agk.path()).unwrap();
        let mut runner = RecordingRunner::default();
        let printer = Printer::new().with_verbosity(Verbosity::Quiet);
        let mut ex = Exporter::new(&toolchain, &mut runner, &printer);

        let action = &plan.actions[0];
        export_linux(&mut ex, &plan, action).unwrap();

        let binary = action.output.join("MyGame32");
        assert_eq!(fs::read_to_string(&binary).unwrap(), "linux32");
        assert!(!action.output.join("Plugins").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&binary).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn test_reexport_replaces_folder() {
        let agk = tempdir().unwrap();
        fake_install(agk.path());
        let project = tempdir().unwrap();
        let release = sample_project(project.path(), &[PlatformTarget::WindowsX86]);

        let plan = resolve_release(&release, project.path()).unwrap();
        let action = &plan.actions[0];
        fs::create_dir_all(&action.output).unwrap();
        fs::write(action.output.join("stale.txt"), "old").unwrap();

        let toolchain = Toolchain::at(agk.path()).unwrap();
        let mut runner = RecordingRunner::default();
        let printer = Printer::new().with_verbosity(Verbosity::Quiet);
        let mut ex = Exporter::new(&toolchain, &mut runner, &printer);
        export_windows(&mut ex, &plan, action).unwrap();

        assert!(!action.output.join("stale.txt").exists());
        assert_eq!(
            fs::read_to_string(action.output.join("MyGame.exe")).unwrap(),
            "win32"
        );
    }
}
