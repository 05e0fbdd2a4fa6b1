//! Validation of release configurations.
//!
//! Runs a suite of checks against each release and reports errors and
//! warnings. Used by `agkbuild validate` and before every resolution; a
//! release with errors is never resolved.

mod checks;
mod warning;

use std::path::Path;

pub use warning::{Diagnostic, Severity, ValidationResult};

use crate::config::{Manifest, ReleaseConfig};
use crate::output::Printer;
use crate::project::AgkProject;

/// Run every check against one release. `root` is the manifest folder.
pub fn validate_release(release: &ReleaseConfig, root: &Path) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.merge(checks::check_required_fields(release));
    result.merge(checks::check_duplicate_platforms(release));

    let project_file = release.project.as_ref().map(|p| root.join(p));
    let project_dir = project_file
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf);

    result.merge(checks::check_include_files(release, project_dir.as_deref()));
    result.merge(checks::check_packaging(release, project_dir.as_deref()));

    if let Some(file) = &project_file {
        match AgkProject::open(file) {
            Ok(project) => {
                match std::fs::read_to_string(project.main_source()) {
                    Ok(source) => {
                        result.merge(checks::check_include_tags(&source, &release.include_tags))
                    }
                    Err(e) => result.push(Diagnostic::error(
                        "agkbuild::validate::main-source",
                        format!("Failed to read main.agc: {}", e),
                    )),
                }
                result.merge(checks::check_media(release, &project.media_path()));
                result.merge(checks::check_android_conflict(release, &project));
            }
            Err(e) => result.push(Diagnostic::error(
                "agkbuild::validate::project",
                e.to_string(),
            )),
        }
    }

    let label = release.label();
    let mut labelled = ValidationResult::new();
    for d in result.iter() {
        labelled.push(d.clone().for_release(label.clone()));
    }
    labelled
}

/// Validate every release of a manifest.
pub fn validate_manifest(manifest: &Manifest, root: &Path) -> ValidationResult {
    let mut result = checks::check_duplicate_labels(manifest);
    for release in &manifest.releases {
        result.merge(validate_release(release, root));
    }
    result
}

/// Print diagnostics to stderr.
pub fn print_diagnostics(result: &ValidationResult, printer: &Printer) {
    for d in result.iter() {
        let is_error = d.severity == Severity::Error;
        eprintln!(
            "{}[{}]: {}",
            printer.severity(&d.severity.to_string(), is_error),
            d.code,
            d
        );
        if let Some(help) = &d.help {
            eprintln!("  {} {}", printer.dim("help:"), help);
        }
    }
}
