//! Validate command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::config::load;
use crate::error::{AgkError, Result};
use crate::output::{plural, Printer};
use crate::validation::{print_diagnostics, validate_manifest};

/// Check a manifest for configuration errors
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Manifest file, or a folder containing agkbuild.yaml
    pub manifest: Option<PathBuf>,
}

pub fn run(args: ValidateArgs, printer: &Printer) -> Result<()> {
    let loaded = load(args.manifest.as_deref())?;
    let result = validate_manifest(&loaded.manifest, &loaded.root);

    print_diagnostics(&result, printer);

    if result.has_errors() {
        return Err(AgkError::Validation {
            message: format!(
                "{}, {}",
                plural(result.error_count(), "error", "errors"),
                plural(result.warning_count(), "warning", "warnings")
            ),
            help: None,
        });
    }

    printer.success(
        "Validated",
        &format!(
            "{} ({})",
            plural(loaded.manifest.releases.len(), "release", "releases"),
            plural(result.warning_count(), "warning", "warnings")
        ),
    );
    Ok(())
}
