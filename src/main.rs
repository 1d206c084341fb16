//! Binary entrypoint for the `horizon` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    horizon::logging::init();

    // Recording is handled in commands::dispatch via HORIZON_RECORD=<dir>.
    match horizon::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
