use clap::Parser;
use datesort::cli::{CliArgs, SortCommand, run_cli};
use datesort::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let command = match SortCommand::from_paths(&args.paths) {
        Ok(command) => command,
        Err(e) => {
            OutputFormatter::fatal(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    // Per-file failures are part of the report, not a failed run.
    match run_cli(command, &args.options()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::fatal(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
