// src/main.rs

use clap::Parser;

use conveyor::cli::CliArgs;
use conveyor::logging;

fn main() {
    let args = CliArgs::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("failed to initialise logging: {err}");
        std::process::exit(1);
    }

    if let Err(err) = conveyor::run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
