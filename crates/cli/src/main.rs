use std::process::ExitCode;

fn main() -> ExitCode {
    reccy_cli::run()
}
