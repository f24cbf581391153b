//! zip-meta-map CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use zip_meta_map::cli::{Cli, Commands};
use zip_meta_map::commands::{run_build, run_diff, run_explain, run_validate, CommandContext};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "zip_meta_map=debug"
    } else {
        "zip_meta_map=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

fn run(cli: Cli) -> zip_meta_map::Result<String> {
    let ctx = CommandContext {
        verbose: cli.verbose,
    };
    match &cli.command {
        Commands::Build(args) => run_build(args, &ctx),
        Commands::Explain(args) => run_explain(args, &ctx),
        Commands::Diff(args) => run_diff(args, &ctx),
        Commands::Validate(args) => run_validate(args, &ctx),
    }
}
