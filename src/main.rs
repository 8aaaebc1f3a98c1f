use std::io;
use std::process::ExitCode;

use dictation_sheets::cli::{parse_cli, run};
use dictation_sheets::logging;

fn main() -> ExitCode {
    let cli = parse_cli();
    logging::init(cli.verbose);
    let stdin = io::stdin();
    match run(&cli, stdin.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
