//! Screenfuse CLI - validate and fuse screening decisions.

mod cli;
mod commands;
mod logger;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let result = match cli.command {
        Commands::Fuse {
            config,
            conflicts,
            json,
        } => commands::fuse::run(config, conflicts, json),

        Commands::Check { config, json } => commands::check::run(config, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
