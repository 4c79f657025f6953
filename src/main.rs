use std::process;

use clap::Parser;
use csim::cli::Cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = csim::run_simulation(&cli) {
        eprintln!("csim: {}", e);
        process::exit(1);
    }
}
