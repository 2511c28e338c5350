//! Panel mediation analysis CLI.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use panelmed_cli::cli::{Cli, Command};
use panelmed_cli::logging::init_logging;

mod commands;
mod summary;

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&cli.log_config(io::stderr().is_terminal())) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }
    let outcome = match &cli.command {
        Command::Run(args) => commands::run(args),
        Command::Compare(args) => commands::compare(args),
        Command::Check(args) => commands::check(args),
    };
    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
