use std::process::ExitCode;

use briefing::cli::output::ErrorPayload;

fn main() -> ExitCode {
    if let Err(err) = briefing::run() {
        eprintln!("{}", ErrorPayload::from_error(&err).to_json());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
