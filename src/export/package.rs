//! Installers and Debian packages built from desktop export folders.

use std::path::Path;

use crate::config::DebianConfig;
use crate::error::{AgkError, Result};
use crate::plan::ReleasePlan;
use crate::toolchain::Invocation;
use crate::types::{Architecture, BuildAction};

use super::files::{copy_tree, make_executable, write_text, ScratchDir};
use super::Exporter;

fn version(plan: &ReleasePlan) -> String {
    plan.project.version.clone().unwrap_or_else(|| "0.0".to_string())
}

fn product_name(plan: &ReleasePlan) -> String {
    plan.config
        .package
        .product_name
        .clone()
        .unwrap_or_else(|| plan.project.name.clone())
}

fn not_configured(what: &str, plan: &ReleasePlan) -> AgkError {
    AgkError::Build {
        message: format!("Release '{}' has no {} settings", plan.label, what),
        help: None,
    }
}

/// Run `makensis` on the release's NSIS script.
pub(super) fn build_installer(
    ex: &mut Exporter,
    plan: &ReleasePlan,
    action: &BuildAction,
    outfile: &Path,
) -> Result<()> {
    let config = plan
        .config
        .package
        .installer
        .as_ref()
        .ok_or_else(|| not_configured("installer", plan))?;

    let mut defines = vec![
        ("PRODUCT_NAME".to_string(), product_name(plan)),
        ("PRODUCT_VERSION".to_string(), version(plan)),
        (
            "PRODUCT_PUBLISHER".to_string(),
            plan.config.package.publisher.clone().unwrap_or_default(),
        ),
        ("EXE_NAME".to_string(), format!("{}.exe", plan.project.name)),
        ("SOURCE_DIR".to_string(), action.output.display().to_string()),
        ("OUTFILE".to_string(), outfile.display().to_string()),
    ];
    defines.extend(config.defines.iter().map(|(k, v)| (k.clone(), v.clone())));

    let invocation = Invocation::new(&config.makensis)
        .args(defines.iter().map(|(key, value)| format!("/D{}={}", key, value)))
        .arg(plan.project.base_path.join(&config.script))
        .cwd(&plan.project.base_path);

    ex.run(invocation)?.check("makensis")?;
    Ok(())
}

/// The `DEBIAN/control` file of a package.
pub fn control_file(
    debian: &DebianConfig,
    version: &str,
    architecture: Architecture,
    description: &str,
) -> String {
    let mut control = format!(
        "Package: {}\nVersion: {}\nSection: {}\nPriority: {}\nArchitecture: {}\nMaintainer: {}\n",
        debian.package,
        version,
        debian.section,
        debian.priority,
        architecture.debian_name(),
        debian.maintainer,
    );
    if !debian.depends.is_empty() {
        control.push_str(&format!("Depends: {}\n", debian.depends.join(", ")));
    }
    control.push_str(&format!("Description: {}\n", description.trim()));
    control
}

/// Stage the export folder under `opt/<package>/` and build a `.deb`.
pub(super) fn build_debian(
    ex: &mut Exporter,
    plan: &ReleasePlan,
    action: &BuildAction,
    deb: &Path,
) -> Result<()> {
    let config = plan
        .config
        .package
        .debian
        .as_ref()
        .ok_or_else(|| not_configured("debian", plan))?;
    let architecture = action.architecture.ok_or_else(|| AgkError::Build {
        message: format!("Target '{}' has no architecture", action.target),
        help: None,
    })?;

    let scratch = ScratchDir::create(plan.project.temp_path())?;
    let stage = scratch.path().join(&config.package);
    let install_dir = stage.join("opt").join(&config.package);
    copy_tree(&action.output, &install_dir, &[])?;

    let player = install_dir.join(format!("{}{}", plan.project.clean_name(), architecture.bits()));
    if player.is_file() {
        make_executable(&player)?;
    }

    let description = plan
        .config
        .package
        .description
        .clone()
        .unwrap_or_else(|| product_name(plan));
    let control_dir = stage.join("DEBIAN");
    std::fs::create_dir_all(&control_dir)
        .map_err(|e| AgkError::io(&control_dir, format!("Failed to create folder: {}", e)))?;
    write_text(
        &control_dir.join("control"),
        &control_file(config, &version(plan), architecture, &description),
    )?;

    let invocation = Invocation::new(&config.dpkg_deb)
        .args(["--build", "--root-owner-group"])
        .arg(&stage)
        .arg(deb)
        .cwd(&plan.project.base_path);

    ex.run(invocation)?.check("dpkg-deb")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{fake_install, sample_project, RecordingRunner};
    use super::*;
    use crate::config::InstallerConfig;
    use crate::output::{Printer, Verbosity};
    use crate::plan::resolve_release;
    use crate::toolchain::{ToolOutput, Toolchain};
    use crate::types::PlatformTarget;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn debian() -> DebianConfig {
        DebianConfig {
            package: "mygame".to_string(),
            maintainer: "Jo Dev <jo@example.com>".to_string(),
            section: "games".to_string(),
            priority: "optional".to_string(),
            depends: vec!["libc6".to_string(), "libgl1".to_string()],
            dpkg_deb: PathBuf::from("dpkg-deb"),
        }
    }

    #[test]
    fn test_control_file() {
        assert_eq!(
            control_file(&debian(), "1.2", Architecture::X64, "A small game\n"),
            "Package: mygame\n\
             Version: 1.2\n\
             Section: games\n\
             Priority: optional\n\
             Architecture: amd64\n\
             Maintainer: Jo Dev <jo@example.com>\n\
             Depends: libc6, libgl1\n\
             Description: A small game\n"
        );

        let mut bare = debian();
        bare.depends.clear();
        let control = control_file(&bare, "1.0", Architecture::X86, "Game");
        assert!(control.contains("Architecture: i386\n"));
        assert!(!control.contains("Depends"));
    }

    #[test]
    fn test_installer_defines() {
        let agk = tempdir().unwrap();
        fake_install(agk.path());
        let project = tempdir().unwrap();
        let mut release = sample_project(project.path(), &[PlatformTarget::WindowsX64]);
        fs::write(project.path().join("setup.nsi"), "; nsis").unwrap();
        release.package.publisher = Some("Example Games".to_string());
        release.package.installer = Some(InstallerConfig {
            script: PathBuf::from("setup.nsi"),
            makensis: PathBuf::from("makensis"),
            defines: BTreeMap::from([("ICON".to_string(), "game.ico".to_string())]),
        });

        let plan = resolve_release(&release, project.path()).unwrap();
        let toolchain = Toolchain::at(agk.path()).unwrap();
        let mut runner = RecordingRunner::default();
        let printer = Printer::new().with_verbosity(Verbosity::Quiet);
        let mut ex = Exporter::new(&toolchain, &mut runner, &printer);

        let action = &plan.actions[0];
        let outfile = action.installer.clone().unwrap();
        build_installer(&mut ex, &plan, action, &outfile).unwrap();

        let call = &runner.calls[0];
        assert_eq!(call.tool_name(), "makensis");
        assert!(call.args.contains(&"/DPRODUCT_NAME=MyGame".to_string()));
        assert!(call.args.contains(&"/DPRODUCT_VERSION=1.0".to_string()));
        assert!(call.args.contains(&"/DPRODUCT_PUBLISHER=Example Games".to_string()));
        assert!(call.args.contains(&"/DEXE_NAME=MyGame.exe".to_string()));
        assert!(call.args.contains(&"/DICON=game.ico".to_string()));
        assert!(call.args.last().unwrap().ends_with("setup.nsi"));
    }

    #[test]
    fn test_debian_staging() {
        let agk = tempdir().unwrap();
        fake_install(agk.path());
        let project = tempdir().unwrap();
        let mut release = sample_project(project.path(), &[PlatformTarget::LinuxX64]);
        release.package.debian = Some(debian());

        let plan = resolve_release(&release, project.path()).unwrap();
        let action = &plan.actions[0];
        fs::create_dir_all(&action.output).unwrap();
        fs::write(action.output.join("MyGame64"), "linux64").unwrap();

        let staged = tempdir().unwrap();
        let copy_to = staged.path().to_path_buf();
        let toolchain = Toolchain::at(agk.path()).unwrap();
        // Snapshot the staging folder while dpkg-deb "runs".
        let mut runner = RecordingRunner::with_responder(move |invocation| {
            let stage = PathBuf::from(&invocation.args[2]);
            copy_tree(&stage, &copy_to, &[]).unwrap();
            ToolOutput {
                code: Some(0),
                ..Default::default()
            }
        });
        let printer = Printer::new().with_verbosity(Verbosity::Quiet);
        let mut ex = Exporter::new(&toolchain, &mut runner, &printer);

        let deb = action.debian_package.clone().unwrap();
        build_debian(&mut ex, &plan, action, &deb).unwrap();

        assert!(deb.to_string_lossy().ends_with("mygame_1.0_amd64.deb"));
        assert_eq!(runner.calls[0].args[..2], ["--build", "--root-owner-group"]);
        assert!(staged.path().join("opt/mygame/MyGame64").is_file());
        let control = fs::read_to_string(staged.path().join("DEBIAN/control")).unwrap();
        assert!(control.contains("Version: 1.0\n"));
        assert!(control.contains("Description: MyGame\n"));
        assert!(!plan.project.temp_path().exists());
    }
}
