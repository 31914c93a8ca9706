//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod convert;
mod recordings;
mod report;

pub use convert::ConvertArgs;
pub use recordings::RecordingsCommands;
pub use report::ReportCommands;
pub use test::TestCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Convert every recording in a directory into Cypress scripts
    Convert(ConvertArgs),
    /// Submit tests to the orchestrator and watch its queue
    Test {
        #[command(subcommand)]
        command: TestCommands,
    },
    /// Check that the orchestrator is up
    Health,
    /// Publish merged run results to Helix
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Manage recordings stored in Helix
    Recordings {
        #[command(subcommand)]
        command: RecordingsCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Convert(args) => convert::handle_convert_command(args).await,
        Commands::Test { command } => test::handle_test_command(command, config).await,
        Commands::Health => test::handle_health_command(config).await,
        Commands::Report { command } => report::handle_report_command(command).await,
        Commands::Recordings { command } => recordings::handle_recordings_command(command).await,
    }
}
