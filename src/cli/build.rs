//! Build command implementation.
//!
//! Loads the manifest, locates the AGK install, resolves every selected
//! release and builds them in order.

use std::path::PathBuf;

use clap::Args;

use crate::config::load;
use crate::error::Result;
use crate::export::{Exporter, Secrets};
use crate::output::{display_path, plural, Printer};
use crate::pipeline::{run_plans, FailurePolicy, ReleaseStatus, RunSummary};
use crate::plan::resolve_all;
use crate::toolchain::{SystemRunner, Toolchain};

/// Compile, export and package the releases in a manifest
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Manifest file, or a folder containing agkbuild.yaml
    pub manifest: Option<PathBuf>,

    /// Build only the named releases (repeatable)
    #[arg(long = "release", short = 'r', value_name = "NAME")]
    pub releases: Vec<String>,

    /// Stop at the first failed release
    #[arg(long)]
    pub fail_fast: bool,

    /// AppGameKit Classic install folder
    #[arg(long, value_name = "DIR")]
    pub agk_path: Option<PathBuf>,
}

pub fn run(args: BuildArgs, printer: &Printer) -> Result<RunSummary> {
    let mut loaded = load(args.manifest.as_deref())?;
    loaded.manifest.select(&args.releases)?;

    let manifest_agk = loaded
        .manifest
        .agk_path
        .as_ref()
        .map(|p| loaded.root.join(p));
    let toolchain = Toolchain::locate(args.agk_path.as_deref(), manifest_agk.as_deref())?;
    printer.info("Using", &format!("AGK at {}", display_path(toolchain.root())));

    let count = loaded.manifest.releases.len();
    printer.status(
        "Resolving",
        &format!(
            "{} from {}",
            plural(count, "release", "releases"),
            display_path(&loaded.path)
        ),
    );
    let plans = resolve_all(&loaded.manifest, &loaded.root);

    let policy = FailurePolicy::from_flag(args.fail_fast || loaded.manifest.fail_fast);
    let mut runner = SystemRunner;
    let mut exporter =
        Exporter::new(&toolchain, &mut runner, printer).with_secrets(Secrets::from_env());
    let summary = run_plans(&mut exporter, plans, policy);

    if summary.outcomes.len() > 1 {
        print_summary(&summary, printer);
    }
    Ok(summary)
}

/// One line per release: passed, failed or skipped.
pub fn print_summary(summary: &RunSummary, printer: &Printer) {
    for outcome in &summary.outcomes {
        match &outcome.status {
            ReleaseStatus::Succeeded { .. } => printer.success("Passed", &outcome.label),
            ReleaseStatus::Failed(_) => printer.error("Failed", &outcome.label),
            ReleaseStatus::Skipped => printer.warning("Skipped", &outcome.label),
        }
    }
    printer.info(
        "Summary",
        &format!(
            "{} passed, {} failed, {} skipped",
            summary.succeeded(),
            summary.failed(),
            summary.skipped()
        ),
    );
}
