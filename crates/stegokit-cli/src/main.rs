use std::process::ExitCode;

use clap::Parser;

mod cli;
mod commands;

pub(crate) type CliResult<T> = stegokit_core::Result<T>;

fn main() -> ExitCode {
    env_logger::init();

    match cli::CliArgs::parse().run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
