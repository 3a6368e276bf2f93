// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nimbus - a small self-hosted streaming chat web server.
//!
//! This is the binary entry point.

use clap::{Parser, Subcommand};

mod serve;

/// Nimbus - a small self-hosted streaming chat web server.
#[derive(Parser, Debug)]
#[command(name = "nimbus", version, about, long_about = None)]
struct Cli {
    /// Path to an explicit config file (skips the XDG hierarchy).
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Nimbus chat server (the default).
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => nimbus_config::load_and_validate_path(path),
        None => nimbus_config::load_and_validate(),
    };
    let config = match config {
        Ok(config) => config,
        Err(errors) => {
            nimbus_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed).
        let config = nimbus_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.gemini.default_model, "gemini-2.5-flash");
    }
}
