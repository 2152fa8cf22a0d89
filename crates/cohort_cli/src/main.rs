//! `cohort` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments and dispatch to `commands`.
//! - Map failures to exit codes: 2 for rejected input, 1 for everything else.

mod args;
mod commands;

use args::Cli;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(commands::exit_code_for(&err))
        }
    }
}
