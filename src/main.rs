//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `webchain` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::io::Write;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use webchain::config::Cli;
use webchain::initialization::init_logger_with;
use webchain::WebClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    let client = WebClient::new(cli.client_config()).context("Failed to set up web client")?;

    let result = match &cli.output {
        Some(path) => client.download(path, Some(cli.url.as_str())).await.map(|()| {
            eprintln!("Saved to {}", path.display());
        }),
        None => match client.get(Some(cli.url.as_str())).await {
            Ok(page) => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(page.as_bytes())
                    .and_then(|()| stdout.flush())
                    .context("Failed to write page to standard output")?;
                Ok(())
            }
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(()) => {
            if let Some(target) = client.redirect() {
                eprintln!("Redirected to {}", target);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("webchain error: {:#}", e);
            process::exit(1);
        }
    }
}
