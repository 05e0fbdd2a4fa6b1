use agkbuild::cli::{Cli, Commands};
use agkbuild::output::Printer;
use clap::Parser;
use miette::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new().with_verbosity(cli.verbosity());

    match cli.command {
        Commands::Build(args) => {
            let summary = agkbuild::cli::build::run(args, &printer)?;
            let code = summary.first_exit_code().filter(|c| *c != 0);
            if let Err(e) = summary.into_result() {
                // Exit with the failing tool's own code where there is one.
                if let Some(code) = code {
                    eprintln!("{:?}", miette::Report::new(e));
                    std::process::exit(code);
                }
                return Err(e.into());
            }
        }
        Commands::Plan(args) => agkbuild::cli::plan::run(args, &printer)?,
        Commands::Validate(args) => agkbuild::cli::validate::run(args, &printer)?,
        Commands::Init(args) => agkbuild::cli::init::run(args, &printer)?,
        Commands::Completions(args) => agkbuild::cli::completions::run(args)?,
    }

    Ok(())
}
