mod platform;

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = platform::run_app() {
        eprintln!("Error: {err:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
