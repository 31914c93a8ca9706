//! Recordings commands
//!
//! Pulls recordings stored in the Helix recording form into the local
//! recordings directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use recast_client::helix::save_recordings;
use recast_client::{HelixClient, HelixConfig};

use super::convert::{ConvertArgs, convert_directory, print_conversion_report};

/// Recordings subcommands
#[derive(Subcommand)]
pub enum RecordingsCommands {
    /// Download every recording from Helix
    Fetch {
        /// Directory the recordings are written to
        #[arg(long, env = "RECORDINGS_DIR", default_value = "recordings")]
        output: PathBuf,

        /// Convert the downloaded recordings right away
        #[arg(long)]
        convert: bool,

        /// Script directory used with --convert
        #[arg(long, env = "SCRIPTS_DIR", default_value = "cypress/e2e")]
        scripts: PathBuf,

        /// Conversion log used with --convert
        #[arg(long, env = "CONVERSION_LOG", default_value = "conversion.log")]
        log: PathBuf,
    },
}

/// Handle recordings commands
pub async fn handle_recordings_command(command: RecordingsCommands) -> Result<()> {
    match command {
        RecordingsCommands::Fetch {
            output,
            convert,
            scripts,
            log,
        } => {
            let helix = HelixClient::new(HelixConfig::from_env()?);
            let token = helix.login().await.context("Helix login failed")?;
            let entries = helix
                .fetch_recordings(&token)
                .await
                .context("Failed to fetch recordings")?;

            let saved = save_recordings(&entries, &output)?;
            println!(
                "{}",
                format!(
                    "✓ Saved {} of {} recording(s) to {}",
                    saved,
                    entries.len(),
                    output.display()
                )
                .green()
                .bold()
            );

            if convert {
                println!();
                let report = convert_directory(ConvertArgs {
                    input: output.clone(),
                    output: scripts,
                    log,
                })
                .await?;
                print_conversion_report(&output, &report);
            }
            Ok(())
        }
    }
}
