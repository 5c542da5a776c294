//! Freshslot store inspector
//!
//! Thin binary over the library's CLI module: resolves the file-backed
//! store and runs the requested subcommand.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use freshslot::cli::{self, Cli};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli::run(cli) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
