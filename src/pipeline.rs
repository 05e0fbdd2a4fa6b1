//! Running resolved release plans.
//!
//! Releases run one at a time in declaration order. Within a release the
//! include tags are applied to `main.agc`, the project is compiled once,
//! and each build action is exported in turn; the first failure aborts
//! the rest of that release. What happens to the releases after a failed
//! one is decided by the [`FailurePolicy`].

use std::path::PathBuf;

use crate::error::{AgkError, Result};
use crate::export::Exporter;
use crate::output::{display_path, plural};
use crate::plan::ReleasePlan;
use crate::project::TagGuard;

/// What to do with the remaining releases after one fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Run every release and report a pass/fail summary.
    #[default]
    Continue,
    /// Stop at the first failed release.
    FailFast,
}

impl FailurePolicy {
    pub fn from_flag(fail_fast: bool) -> Self {
        if fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::Continue
        }
    }
}

#[derive(Debug)]
pub enum ReleaseStatus {
    Succeeded { artifacts: Vec<PathBuf> },
    Failed(AgkError),
    /// Not attempted because an earlier release failed under fail-fast.
    Skipped,
}

#[derive(Debug)]
pub struct ReleaseOutcome {
    pub label: String,
    pub status: ReleaseStatus,
}

impl ReleaseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, ReleaseStatus::Succeeded { .. })
    }
}

/// Per-release results of a run, in declaration order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<ReleaseOutcome>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ReleaseStatus::Failed(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ReleaseStatus::Skipped))
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0
    }

    /// Exit code of the first failing external tool, if any.
    pub fn first_exit_code(&self) -> Option<i32> {
        self.outcomes.iter().find_map(|o| match &o.status {
            ReleaseStatus::Failed(e) => e.exit_code(),
            _ => None,
        })
    }

    /// `Ok` when every release succeeded. Failures were already reported
    /// as they happened, so the error only counts them.
    pub fn into_result(self) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }
        Err(AgkError::Build {
            message: format!(
                "{} failed, {} skipped",
                plural(self.failed(), "release", "releases"),
                self.skipped()
            ),
            help: Some("See the errors above for each failed release".to_string()),
        })
    }
}

fn compile_and_export(ex: &mut Exporter, plan: &ReleasePlan) -> Result<Vec<PathBuf>> {
    ex.compile(plan)?;
    let mut artifacts = Vec::new();
    for action in &plan.actions {
        artifacts.extend(ex.export(plan, action)?);
    }
    Ok(artifacts)
}

/// Build one release. `main.agc` is restored whether or not the build
/// succeeded.
pub fn build_release(ex: &mut Exporter, plan: &ReleasePlan) -> Result<Vec<PathBuf>> {
    let guard = if plan.include_tags.is_empty() {
        None
    } else {
        Some(TagGuard::apply(&plan.project.main_source(), &plan.include_tags)?)
    };

    let result = compile_and_export(ex, plan);
    let restored = guard.map(TagGuard::restore).transpose();

    match (result, restored) {
        (Ok(artifacts), Ok(_)) => Ok(artifacts),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(_)) => Err(e),
        (Err(e), Err(restore)) => {
            ex.printer().error("Failed", &format!("restoring main.agc: {}", restore));
            Err(e)
        }
    }
}

/// Build every resolved release under `policy`. Releases that failed to
/// resolve are reported as failures without being built.
pub fn run_plans(
    ex: &mut Exporter,
    plans: Vec<(String, Result<ReleasePlan>)>,
    policy: FailurePolicy,
) -> RunSummary {
    let mut summary = RunSummary::default();
    let mut halted = false;

    for (label, plan) in plans {
        if halted {
            summary.outcomes.push(ReleaseOutcome {
                label,
                status: ReleaseStatus::Skipped,
            });
            continue;
        }

        let result = plan.and_then(|plan| build_release(ex, &plan));
        let status = match result {
            Ok(artifacts) => {
                let shown = artifacts.first().map(|a| display_path(a)).unwrap_or_default();
                ex.printer().success(
                    "Finished",
                    &format!("{} ({}) {}", label, plural(artifacts.len(), "artifact", "artifacts"), shown),
                );
                ReleaseStatus::Succeeded { artifacts }
            }
            Err(error) => {
                ex.printer().error("Failed", &format!("{}: {}", label, error));
                halted = policy == FailurePolicy::FailFast;
                ReleaseStatus::Failed(error)
            }
        };
        summary.outcomes.push(ReleaseOutcome { label, status });
    }

    summary
}
