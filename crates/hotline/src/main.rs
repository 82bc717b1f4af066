// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hotline - a support desk bot for user feedback and questions.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hotline_config::{ConfigError, HotlineConfig};

/// Hotline - a support desk bot for user feedback and questions.
#[derive(Parser, Debug)]
#[command(name = "hotline", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the chat bot and the web gateway.
    Serve,
    /// Validate the configuration and print the effective values.
    Check,
}

fn load(path: Option<&PathBuf>) -> Result<HotlineConfig, Vec<ConfigError>> {
    match path {
        Some(path) => hotline_config::load_and_validate_path(path),
        None => hotline_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            hotline_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Check) => {
            if let Err(e) = check::run_check(&config) {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        None => {
            println!("hotline: use --help for available commands");
        }
    }
}
