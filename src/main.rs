use std::process::ExitCode;

fn main() -> ExitCode {
    match tagscribe::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tagscribe::ui::output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
