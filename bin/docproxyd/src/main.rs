#![deny(unsafe_code)]

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use cli::Args;

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = logging::init(args.verbose) {
        eprintln!("failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    let config = daemon::Config::new(
        args.listen,
        args.backend,
        args.connect_timeout.map(Duration::from_secs),
        args.backend_pool_size,
    );

    match daemon::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "docproxyd exited with an error");
            ExitCode::FAILURE
        }
    }
}
