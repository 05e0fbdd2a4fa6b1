pub mod build;
pub mod completions;
pub mod init;
pub mod plan;
pub mod validate;

use clap::{Parser, Subcommand};

use crate::output::Verbosity;

/// agkbuild - Build and package AppGameKit Classic releases
#[derive(Parser, Debug)]
#[command(name = "agkbuild")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Only print warnings and errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also print every external tool invocation
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        match (self.quiet, self.verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile, export and package the releases in a manifest
    Build(build::BuildArgs),

    /// Resolve releases into build actions without building anything
    Plan(plan::PlanArgs),

    /// Check a manifest for configuration errors
    Validate(validate::ValidateArgs),

    /// Generate an agkbuild.yaml for an AGK project
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_verbosity_flags() {
        let cli = Cli::parse_from(["agkbuild", "build", "--quiet"]);
        assert_eq!(cli.verbosity(), Verbosity::Quiet);

        let cli = Cli::parse_from(["agkbuild", "-v", "plan", "--json"]);
        assert_eq!(cli.verbosity(), Verbosity::Verbose);
        assert!(matches!(cli.command, Commands::Plan(ref args) if args.json));

        assert!(Cli::try_parse_from(["agkbuild", "-q", "-v", "validate"]).is_err());
    }

    #[test]
    fn test_build_args() {
        let cli = Cli::parse_from([
            "agkbuild",
            "build",
            "release.yaml",
            "--release",
            "demo",
            "-r",
            "full",
            "--fail-fast",
            "--agk-path",
            "/opt/agk",
        ]);
        let Commands::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.manifest.as_deref(), Some(std::path::Path::new("release.yaml")));
        assert_eq!(args.releases, vec!["demo", "full"]);
        assert!(args.fail_fast);
        assert_eq!(args.agk_path.as_deref(), Some(std::path::Path::new("/opt/agk")));
    }
}
