//! Plan command implementation.
//!
//! Resolves releases without compiling or writing anything, and shows the
//! build actions each would run.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::config::load;
use crate::error::{AgkError, Result};
use crate::output::{display_path, plural, Printer};
use crate::plan::{resolve_all, ReleasePlan};

/// Resolve releases into build actions without building anything
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Manifest file, or a folder containing agkbuild.yaml
    pub manifest: Option<PathBuf>,

    /// Plan only the named releases (repeatable)
    #[arg(long = "release", short = 'r', value_name = "NAME")]
    pub releases: Vec<String>,

    /// Print the plans as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PlanEntry<'a> {
    release: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<&'a ReleasePlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn run(args: PlanArgs, printer: &Printer) -> Result<()> {
    let mut loaded = load(args.manifest.as_deref())?;
    loaded.manifest.select(&args.releases)?;
    let plans = resolve_all(&loaded.manifest, &loaded.root);

    if args.json {
        let entries: Vec<PlanEntry> = plans
            .iter()
            .map(|(label, plan)| PlanEntry {
                release: label,
                plan: plan.as_ref().ok(),
                error: plan.as_ref().err().map(ToString::to_string),
            })
            .collect();
        let json = serde_json::to_string_pretty(&entries).map_err(|e| AgkError::Build {
            message: format!("Failed to serialize plans: {}", e),
            help: None,
        })?;
        println!("{}", json);
    } else {
        for (label, plan) in &plans {
            match plan {
                Ok(plan) => print_plan(plan, printer),
                Err(e) => printer.error("Failed", &format!("{}: {}", label, e)),
            }
        }
    }

    let failed = plans.iter().filter(|(_, p)| p.is_err()).count();
    if failed > 0 {
        return Err(AgkError::Build {
            message: format!("{} could not be resolved", plural(failed, "release", "releases")),
            help: Some("Run `agkbuild validate` for details".to_string()),
        });
    }
    Ok(())
}

fn print_plan(plan: &ReleasePlan, printer: &Printer) {
    let mut heading = plan.label.clone();
    if let Some(version) = &plan.project.version {
        heading.push_str(&format!(" v{}", version));
    }
    printer.info("Release", &printer.bold(&heading));
    printer.info(
        "Media",
        &format!(
            "{} ({} excluded)",
            plural(plan.media.len(), "file", "files"),
            plan.media.excluded.len()
        ),
    );
    for (tag, file) in &plan.include_tags {
        printer.info("Tag", &format!("@@{} {} {}", tag, printer.dim("->"), file));
    }
    for action in &plan.actions {
        printer.info(
            action.target.name(),
            &format!("{} {}", printer.dim("->"), printer.cyan(&display_path(action.artifact()))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Verbosity;
    use std::fs;
    use tempfile::tempdir;

    fn quiet() -> Printer {
        Printer::new().with_verbosity(Verbosity::Quiet)
    }

    #[test]
    fn test_plan_writes_nothing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Game.agk"), "[apk_settings]\napp_type=0\n").unwrap();
        fs::write(dir.path().join("main.agc"), "#constant VERSION \"2.1\"\n").unwrap();
        fs::create_dir_all(dir.path().join("media")).unwrap();
        fs::write(dir.path().join("media/logo.png"), "png").unwrap();
        fs::write(
            dir.path().join("agkbuild.yaml"),
            "releases:\n  - { project: Game.agk, platforms: [windows-x86, linux-x86] }\n",
        )
        .unwrap();

        let args = PlanArgs {
            manifest: Some(dir.path().to_path_buf()),
            releases: vec![],
            json: false,
        };
        run(args, &quiet()).unwrap();
        assert!(!dir.path().join("release").exists());
    }

    #[test]
    fn test_plan_reports_unresolvable_release() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("agkbuild.yaml"),
            "releases:\n  - { platforms: [html5] }\n",
        )
        .unwrap();

        let args = PlanArgs {
            manifest: Some(dir.path().to_path_buf()),
            releases: vec![],
            json: false,
        };
        let err = run(args, &quiet()).unwrap_err();
        assert!(err.to_string().contains("1 release could not be resolved"));
    }
}
