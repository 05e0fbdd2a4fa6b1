use crate::error::Result;
use crate::plan::ReleasePlan;
use crate::project::MAIN_SOURCE;
use crate::toolchain::Invocation;

use super::Exporter;

/// Run `AGKCompiler -agk main.agc` in the project folder. The compiler
/// prints errors on stdout and nothing on success.
pub(super) fn compile(ex: &mut Exporter, plan: &ReleasePlan) -> Result<()> {
    let invocation = Invocation::new(ex.toolchain.compiler())
        .args(["-agk", MAIN_SOURCE])
        .cwd(&plan.project.base_path);

    ex.run(invocation)?.check_silent("AGKCompiler")?;
    Ok(())
}
