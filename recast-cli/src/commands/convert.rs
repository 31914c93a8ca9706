//! Convert command
//!
//! Batch conversion of a recordings directory, run locally without the
//! orchestrator.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use recast_compiler::{ConversionDriver, ConversionLog, ConversionReport};

/// Arguments for `recast convert`
#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Directory holding recording JSON files
    #[arg(long, env = "RECORDINGS_DIR", default_value = "recordings")]
    pub input: PathBuf,

    /// Directory the scripts are written to
    #[arg(long, env = "SCRIPTS_DIR", default_value = "cypress/e2e")]
    pub output: PathBuf,

    /// Conversion log file
    #[arg(long, env = "CONVERSION_LOG", default_value = "conversion.log")]
    pub log: PathBuf,
}

/// Handle `recast convert`
pub async fn handle_convert_command(args: ConvertArgs) -> Result<()> {
    let input = args.input.clone();
    let report = convert_directory(args).await?;
    print_conversion_report(&input, &report);

    if !report.failed.is_empty() {
        anyhow::bail!("{} recording(s) failed to convert", report.failed.len());
    }
    Ok(())
}

/// Run the conversion on a blocking thread
pub(crate) async fn convert_directory(args: ConvertArgs) -> Result<ConversionReport> {
    let driver = ConversionDriver::new(args.output, ConversionLog::new(args.log));
    let input = args.input;
    tracing::debug!("Converting {} into {}", input.display(), driver.output_dir().display());

    tokio::task::spawn_blocking(move || driver.convert_all(&input))
        .await
        .context("Conversion task failed")?
        .context("Failed to convert recordings")
}

pub(crate) fn print_conversion_report(input: &Path, report: &ConversionReport) {
    if report.is_empty() {
        println!(
            "{}",
            format!("No recordings found in {}.", input.display()).yellow()
        );
        return;
    }

    for converted in &report.converted {
        println!(
            "{} {} -> {}",
            "✓".green().bold(),
            converted.source.display(),
            converted.script.display().to_string().cyan()
        );
        if converted.diagnostics > 0 {
            println!(
                "  {}",
                format!("{} step(s) skipped or unhandled, see the conversion log", converted.diagnostics)
                    .dimmed()
            );
        }
    }

    for failed in &report.failed {
        println!(
            "{} {}: {}",
            "✗".red().bold(),
            failed.source.display(),
            failed.error
        );
    }

    println!();
    println!(
        "{}",
        format!(
            "Converted {} of {} recording(s)",
            report.converted.len(),
            report.converted.len() + report.failed.len()
        )
        .bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_convert_directory_writes_scripts() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("recordings");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(
            input.join("Sign In.json"),
            r#"{ "title": "Sign In", "steps": [{ "type": "navigate", "url": "https://example.com" }] }"#,
        )
        .unwrap();
        std::fs::write(input.join("broken.json"), "not json").unwrap();

        let report = convert_directory(ConvertArgs {
            input: input.clone(),
            output: dir.path().join("e2e"),
            log: dir.path().join("conversion.log"),
        })
        .await
        .unwrap();

        assert_eq!(report.converted.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.converted[0].script.exists());
        assert!(input.join("broken.json").exists());
    }

    #[tokio::test]
    async fn test_missing_input_directory_is_empty_report() {
        let dir = TempDir::new().unwrap();
        let report = convert_directory(ConvertArgs {
            input: dir.path().join("nope"),
            output: dir.path().join("e2e"),
            log: dir.path().join("conversion.log"),
        })
        .await
        .unwrap();
        assert!(report.is_empty());
    }
}
