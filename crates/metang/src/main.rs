use std::process::ExitCode;

use clap::Parser;
use metang::{Cli, Error, Options};
use metang_log::Level;
use tracing::debug;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = metang_log::init_from_env(Level::default().raised(cli.verbose)) {
        eprintln!("metang: {err}");
    }

    let result = Options::try_from(cli.command).and_then(|opts| metang::execute(&opts));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Error::Arena(cause) = &err {
                debug!(%cause, "allocation failure");
            }
            eprintln!("metang: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
