//! Exports: compiling a release and producing each of its build actions.
//!
//! An [`Exporter`] owns nothing but references: the located toolchain,
//! the command runner every external tool goes through, and the printer.
//! Each export writes only inside the project's `release/` folder and
//! its `build_tmp/` scratch folder.

mod apk;
mod archive;
mod compile;
mod desktop;
mod files;
mod html5;
mod package;

use std::path::PathBuf;

use crate::error::Result;
use crate::output::{display_path, Printer};
use crate::plan::ReleasePlan;
use crate::toolchain::{CommandRunner, Invocation, ToolOutput, Toolchain};
use crate::types::{BuildAction, Platform};

pub use apk::{ApkSettings, ArCore, FirebaseIds, Orientation, Permissions, Signing};
pub use archive::archive_folder;
pub use files::{copy_include_files, copy_media, copy_tree, ScratchDir};
pub use html5::{patch_player_js, Html5Package};
pub use package::control_file;

/// Environment variable holding the APK keystore password.
pub const KEYSTORE_PASSWORD_ENV: &str = "AGKBUILD_KEYSTORE_PASSWORD";
/// Environment variable holding the APK alias password.
pub const ALIAS_PASSWORD_ENV: &str = "AGKBUILD_ALIAS_PASSWORD";

/// Signing passwords, kept out of the manifest.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub keystore_password: Option<String>,
    pub alias_password: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            keystore_password: std::env::var(KEYSTORE_PASSWORD_ENV).ok(),
            alias_password: std::env::var(ALIAS_PASSWORD_ENV).ok(),
        }
    }
}

/// Runs the compiler and the per-target exports of resolved plans.
pub struct Exporter<'a> {
    toolchain: &'a Toolchain,
    runner: &'a mut dyn CommandRunner,
    printer: &'a Printer,
    secrets: Secrets,
}

impl<'a> Exporter<'a> {
    pub fn new(
        toolchain: &'a Toolchain,
        runner: &'a mut dyn CommandRunner,
        printer: &'a Printer,
    ) -> Self {
        Self {
            toolchain,
            runner,
            printer,
            secrets: Secrets::default(),
        }
    }

    pub fn with_secrets(mut self, secrets: Secrets) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn printer(&self) -> &Printer {
        self.printer
    }

    /// Compile the release's `main.agc` to bytecode.
    pub fn compile(&mut self, plan: &ReleasePlan) -> Result<()> {
        let mut message = plan.project.name.clone();
        if let Some(version) = &plan.project.version {
            message.push_str(&format!(" v{}", version));
        }
        if let Some(release) = &plan.project.release_name {
            message.push_str(&format!(" ({})", release));
        }
        self.printer.status("Compiling", &message);
        compile::compile(self, plan)
    }

    /// Produce one action's output, then its packages and archive.
    /// Returns the files the action left behind.
    pub fn export(&mut self, plan: &ReleasePlan, action: &BuildAction) -> Result<Vec<PathBuf>> {
        self.printer.status(
            "Exporting",
            &format!("{} for {}", plan.project.name, action.describe()),
        );

        match action.platform {
            Platform::Windows => desktop::export_windows(self, plan, action)?,
            Platform::Linux => desktop::export_linux(self, plan, action)?,
            Platform::Html5 => html5::export(self, plan, action)?,
            Platform::Android => {
                apk::export(self, plan, action)?;
                return Ok(vec![action.output.clone()]);
            }
        }

        files::copy_include_files(&action.include_files, &action.output)?;

        let mut artifacts = Vec::new();
        if let Some(installer) = &action.installer {
            self.printer.status("Packaging", &display_path(installer));
            package::build_installer(self, plan, action, installer)?;
            artifacts.push(installer.clone());
        }
        if let Some(deb) = &action.debian_package {
            self.printer.status("Packaging", &display_path(deb));
            package::build_debian(self, plan, action, deb)?;
            artifacts.push(deb.clone());
        }

        match &action.archive {
            Some(zip) => {
                self.printer.status("Archiving", &display_path(zip));
                archive::archive_folder(&action.output, zip)?;
                artifacts.insert(0, zip.clone());
            }
            None => artifacts.insert(0, action.output.clone()),
        }
        Ok(artifacts)
    }

    fn run(&mut self, invocation: Invocation) -> Result<ToolOutput> {
        self.printer.detail(
            "Running",
            &format!("{} {}", invocation.program.display(), invocation.display_args()),
        );
        self.runner.run(&invocation)
    }
}
