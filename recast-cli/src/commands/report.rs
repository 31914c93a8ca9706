//! Report commands
//!
//! Publishing merged run results outside the orchestrator queue.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use recast_client::{HelixClient, HelixConfig, publish_results};

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// Publish a merged results file to Helix, then remove the artifacts
    Publish {
        /// Merged results file
        #[arg(long, env = "RESULTS_PATH", default_value = "cypress/results.json")]
        results: PathBuf,

        /// Root of the per-spec screenshot directories
        #[arg(long, env = "SCREENSHOTS_DIR", default_value = "cypress/screenshots")]
        screenshots: PathBuf,

        /// Directory holding the per-spec report files
        #[arg(long, env = "REPORTS_DIR", default_value = "cypress/reports")]
        reports: PathBuf,

        /// Identifier stamped on every published report
        #[arg(long, env = "TEST_RUN_ID")]
        run_id: String,
    },
}

/// Handle report commands
pub async fn handle_report_command(command: ReportCommands) -> Result<()> {
    match command {
        ReportCommands::Publish {
            results,
            screenshots,
            reports,
            run_id,
        } => {
            let helix = HelixClient::new(HelixConfig::from_env()?);

            println!(
                "{}",
                format!("Publishing {} to {}...", results.display(), helix.config().url).dimmed()
            );

            let summary = publish_results(&helix, &results, &screenshots, &reports, &run_id)
                .await
                .context("Failed to publish results")?;

            println!(
                "{}",
                format!("✓ Published {} result(s)", summary.posted).green().bold()
            );
            if summary.failed_tests > 0 {
                println!(
                    "  {}",
                    format!("{} failed test(s) in this run", summary.failed_tests).yellow()
                );
            }
            Ok(())
        }
    }
}
