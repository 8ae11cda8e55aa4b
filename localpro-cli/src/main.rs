//! Entry point for the `localpro` command-line interface.
#![forbid(unsafe_code)]

use std::process::ExitCode;

fn main() -> ExitCode {
    localpro_cli::init_logging();
    match localpro_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("localpro: {err}");
            ExitCode::FAILURE
        }
    }
}
