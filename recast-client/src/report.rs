//! Result aggregation and publishing
//!
//! Reads the merged Mochawesome document produced after a run, turns every
//! test case of every top-level suite into a [`TestReport`], attaches a
//! screenshot to failed tests, and posts the reports to Helix. Run artifacts
//! are purged after every publish attempt so a later run never re-posts them.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};
use recast_core::domain::report::TestReport;
use recast_core::dto::report::EntryPayload;
use serde::Deserialize;

use crate::error::{ClientError, Result};
use crate::helix::HelixClient;

/// Screenshots above this raw size are cut
pub const MAX_SCREENSHOT_BYTES: usize = 500 * 1024;

// =============================================================================
// Merged document
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MergedResults {
    #[serde(default)]
    pub stats: Option<RunStats>,
    #[serde(default)]
    pub results: Vec<SpecResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunStats {
    #[serde(default)]
    pub end: Option<String>,
}

/// Results of one spec file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecResult {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub suites: Vec<Suite>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Suite {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub full_title: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pass: Option<bool>,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub err: Option<TestFailure>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestFailure {
    #[serde(default)]
    pub message: Option<String>,
}

impl MergedResults {
    /// Read a merged results file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ClientError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            ClientError::ParseError(format!("Invalid results file {}: {}", path.display(), e))
        })
    }

    /// End of the run as ISO-8601 with milliseconds, or now
    pub fn run_time(&self) -> String {
        self.stats
            .as_ref()
            .and_then(|stats| stats.end.as_deref())
            .and_then(|end| DateTime::parse_from_rfc3339(end).ok())
            .map(|end| end.with_timezone(&Utc))
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

// =============================================================================
// Report building
// =============================================================================

/// Turn a merged document into one report per test case
///
/// # Arguments
/// * `results` - The merged results document
/// * `run_id` - Run identifier stamped on every report
/// * `screenshots_dir` - Root of the per-spec screenshot directories
pub fn build_reports(results: &MergedResults, run_id: &str, screenshots_dir: &Path) -> Vec<TestReport> {
    let run_time = results.run_time();
    let mut reports = Vec::new();

    for spec in &results.results {
        let file = spec.file.clone().unwrap_or_else(|| "unknown".to_string());

        for suite in &spec.suites {
            for test in &suite.tests {
                let test_name = test.title.clone().unwrap_or_else(|| "unknown".to_string());
                let status = test.state.clone().unwrap_or_else(|| {
                    if test.pass.unwrap_or(false) {
                        "passed".to_string()
                    } else {
                        "failed".to_string()
                    }
                });

                let mut report = TestReport {
                    full_title: test.full_title.clone().unwrap_or_else(|| test_name.clone()),
                    test_name,
                    status,
                    duration_ms: test.duration.unwrap_or(0),
                    run_time: run_time.clone(),
                    file_name: file.clone(),
                    suite_title: suite.title.clone().unwrap_or_default(),
                    error_message: test
                        .err
                        .as_ref()
                        .and_then(|err| err.message.clone())
                        .unwrap_or_default(),
                    screenshot_base64: String::new(),
                    screenshot_missing: true,
                    test_run_id: run_id.to_string(),
                };

                if report.is_failed() {
                    attach_screenshot(&mut report, screenshots_dir);
                }
                reports.push(report);
            }
        }
    }

    reports
}

fn attach_screenshot(report: &mut TestReport, screenshots_dir: &Path) {
    let Some(path) = find_screenshot(screenshots_dir, &report.file_name) else {
        tracing::warn!("No screenshot found for {}", report.full_title);
        return;
    };

    match encode_screenshot(&path) {
        Ok(encoded) => {
            tracing::info!("Attaching screenshot {}", path.display());
            report.screenshot_base64 = encoded;
            report.screenshot_missing = false;
        }
        Err(e) => tracing::warn!("Failed to read screenshot {}: {}", path.display(), e),
    }
}

/// First `.png` by name in `<screenshots_dir>/<spec file name>/`
pub fn find_screenshot(screenshots_dir: &Path, spec_file: &str) -> Option<PathBuf> {
    let spec_name = Path::new(spec_file).file_name()?;
    let dir = screenshots_dir.join(spec_name);

    let mut pngs: Vec<PathBuf> = std::fs::read_dir(&dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    pngs.sort();
    pngs.into_iter().next()
}

/// Base64-encode a screenshot
///
/// When the image exceeds [`MAX_SCREENSHOT_BYTES`] the encoded text is cut
/// to that many characters, which leaves a truncated image.
pub fn encode_screenshot(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| ClientError::io(path, e))?;
    let mut encoded = STANDARD.encode(&bytes);
    if bytes.len() > MAX_SCREENSHOT_BYTES {
        tracing::warn!(
            "Screenshot {} is {} bytes, cutting encoded data to {} characters",
            path.display(),
            bytes.len(),
            MAX_SCREENSHOT_BYTES
        );
        encoded.truncate(MAX_SCREENSHOT_BYTES);
    }
    Ok(encoded)
}

// =============================================================================
// Publishing
// =============================================================================

/// Outcome of a publish run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub posted: usize,
    pub failed_tests: usize,
}

/// Post every report to the results form
///
/// Logs in once and stops at the first rejected entry.
pub async fn publish(helix: &HelixClient, reports: &[TestReport]) -> Result<PublishSummary> {
    let form = helix
        .config()
        .results_form
        .clone()
        .ok_or_else(|| ClientError::MissingConfig("HELIX_FORM".to_string()))?;

    let token = helix.login().await?;
    let mut summary = PublishSummary::default();

    for report in reports {
        tracing::info!("Posting {} ({})", report.test_name, report.status);
        helix
            .post_entry(&token, &form, &EntryPayload::from(report.clone()))
            .await?;
        summary.posted += 1;
        if report.is_failed() {
            summary.failed_tests += 1;
        }
    }

    tracing::info!("Posted {} test results to Helix", summary.posted);
    Ok(summary)
}

/// Load, build, publish, then purge the run artifacts whatever happened
///
/// # Arguments
/// * `helix` - Reporting system client
/// * `results_path` - Merged results file
/// * `screenshots_dir` - Root of the per-spec screenshot directories
/// * `reports_dir` - Directory holding the per-spec report files
/// * `run_id` - Run identifier stamped on every report
pub async fn publish_results(
    helix: &HelixClient,
    results_path: &Path,
    screenshots_dir: &Path,
    reports_dir: &Path,
    run_id: &str,
) -> Result<PublishSummary> {
    let outcome = match MergedResults::load(results_path) {
        Ok(results) => {
            let reports = build_reports(&results, run_id, screenshots_dir);
            publish(helix, &reports).await
        }
        Err(e) => Err(e),
    };

    purge_artifacts(results_path, reports_dir);
    outcome
}

/// Delete the merged results file and `mochawesome*.json` report files
///
/// Missing files are ignored and removal failures are only logged.
///
/// # Returns
/// The number of files removed
pub fn purge_artifacts(results_path: &Path, reports_dir: &Path) -> usize {
    let mut removed = 0;

    if results_path.exists() {
        match std::fs::remove_file(results_path) {
            Ok(()) => {
                tracing::info!("Removed {}", results_path.display());
                removed += 1;
            }
            Err(e) => tracing::warn!("Failed to remove {}: {}", results_path.display(), e),
        }
    }

    let Ok(entries) = std::fs::read_dir(reports_dir) else {
        return removed;
    };
    for path in entries.filter_map(|entry| entry.ok().map(|entry| entry.path())) {
        let is_report = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("mochawesome") && name.ends_with(".json"));
        if !is_report {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed {}", path.display());
                removed += 1;
            }
            Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
        }
    }

    removed
}
