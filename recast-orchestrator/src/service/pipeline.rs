//! Pipeline Stages
//!
//! The four stages every job goes through. The queue only sees the
//! [`JobPipeline`] trait; [`StandardPipeline`] is the production
//! implementation backed by the filesystem, the compiler, external
//! processes and Helix.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use recast_client::helix::HelixClient;
use recast_client::report::{publish_results, purge_artifacts};
use recast_compiler::{ConversionDriver, ConversionLog};
use recast_core::domain::job::{Job, StageResult};

use crate::config::Config;
use crate::repository::recording_repository;
use crate::service::process::ExternalCommand;

/// The stages a job runs through, in order
///
/// An `Err` from `persist` or `compile` ends the job. `execute` and `report`
/// results are recorded and the job still completes.
#[async_trait]
pub trait JobPipeline: Send + Sync {
    /// Store the raw recording; returns its path
    async fn persist(&self, job: &Job) -> Result<PathBuf>;

    /// Compile the stored recording; returns the script path
    async fn compile(&self, job: &Job, recording: &Path) -> Result<PathBuf>;

    /// Run the script with the external runner
    async fn execute(&self, job: &Job, script: &Path) -> Result<StageResult>;

    /// Merge the runner's reports and publish them
    async fn report(&self, job: &Job) -> Result<StageResult>;
}

/// Production pipeline
pub struct StandardPipeline {
    config: Arc<Config>,
    helix: Option<HelixClient>,
}

impl StandardPipeline {
    /// # Arguments
    /// * `config` - Directories, commands and limits
    /// * `helix` - Reporting client; `None` makes every report stage fail
    pub fn new(config: Arc<Config>, helix: Option<HelixClient>) -> Self {
        Self { config, helix }
    }

    /// Merge the per-spec reports into the results file
    async fn merge_reports(&self) -> Result<usize> {
        let results_path = &self.config.results_path;
        if tokio::fs::try_exists(results_path).await.unwrap_or(false) {
            tokio::fs::remove_file(results_path)
                .await
                .with_context(|| format!("Failed to remove stale {}", results_path.display()))?;
        }

        let reports = list_reports(&self.config.reports_dir).await?;
        if reports.is_empty() {
            anyhow::bail!("No report files in {}", self.config.reports_dir.display());
        }

        let command = reports
            .iter()
            .fold(ExternalCommand::new(&self.config.merge_command), |command, report| {
                command.path_arg(report)
            })
            .capture_stdout();
        let output = command.run(self.config.stage_timeout).await?;
        if !output.success() {
            anyhow::bail!("Report merge exited with {:?}", output.exit_code);
        }

        if let Some(parent) = results_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(results_path, output.stdout)
            .await
            .with_context(|| format!("Failed to write {}", results_path.display()))?;

        tracing::info!("Merged {} report files into {}", reports.len(), results_path.display());
        Ok(reports.len())
    }
}

#[async_trait]
impl JobPipeline for StandardPipeline {
    async fn persist(&self, job: &Job) -> Result<PathBuf> {
        recording_repository::save(&self.config.recordings_dir, job).await
    }

    async fn compile(&self, _job: &Job, recording: &Path) -> Result<PathBuf> {
        let driver = ConversionDriver::new(
            self.config.scripts_dir.clone(),
            ConversionLog::new(self.config.conversion_log.clone()),
        );
        let recording = recording.to_path_buf();

        let converted = tokio::task::spawn_blocking(move || driver.convert_file(&recording))
            .await
            .context("Compiler task failed")??;

        if converted.diagnostics > 0 {
            tracing::warn!(
                "{} compiled with {} skipped or unhandled steps",
                converted.script.display(),
                converted.diagnostics
            );
        }
        Ok(converted.script)
    }

    async fn execute(&self, job: &Job, script: &Path) -> Result<StageResult> {
        let output = ExternalCommand::new(&self.config.runner_command)
            .arg("--spec")
            .path_arg(script)
            .env("TEST_RUN_ID", job.run_id.clone())
            .run(self.config.stage_timeout)
            .await?;

        let result = if output.success() {
            StageResult::ok("Runner finished")
        } else {
            StageResult::failed(format!("Runner exited with {:?}", output.exit_code))
        };
        Ok(result.with_exit_code(output.exit_code))
    }

    async fn report(&self, job: &Job) -> Result<StageResult> {
        let config = &self.config;

        if let Err(e) = self.merge_reports().await {
            purge_artifacts(&config.results_path, &config.reports_dir);
            return Err(e.context("Failed to merge reports"));
        }

        let Some(helix) = &self.helix else {
            purge_artifacts(&config.results_path, &config.reports_dir);
            anyhow::bail!("Helix is not configured, results were not published");
        };

        let summary = publish_results(
            helix,
            &config.results_path,
            &config.screenshots_dir,
            &config.reports_dir,
            &job.run_id,
        )
        .await
        .context("Failed to publish results")?;

        Ok(StageResult::ok(format!(
            "Published {} results ({} failed)",
            summary.posted, summary.failed_tests
        )))
    }
}

/// `*.json` files in `dir`, sorted by name
async fn list_reports(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to list {}", dir.display())),
    };

    let mut reports = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            reports.push(path);
        }
    }
    reports.sort();
    Ok(reports)
}
