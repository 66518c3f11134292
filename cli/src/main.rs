//! Main entry point for tql CLI

use clap::Parser;

mod cli;
mod commands;
mod output;

use cli::Cli;
use commands::execute_command;

fn main() {
    // Load environment variables from .env file if present
    if std::path::Path::new(".env").exists() {
        if let Err(e) = dotenv::dotenv() {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging, raised to debug when verbose output is requested
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    // Execute the command
    if let Err(e) = execute_command(cli.command, cli.config.as_deref()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
