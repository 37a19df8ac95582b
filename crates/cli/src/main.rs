use std::process::ExitCode;

fn main() -> ExitCode {
    skyline_cli::run()
}
