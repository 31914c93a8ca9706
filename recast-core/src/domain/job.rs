//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A queued request to compile, execute and report a single recording
///
/// The recording is kept as raw JSON: it is persisted verbatim and only
/// interpreted by the compile stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub test_name: String,
    pub run_id: String,
    pub recording: JsonValue,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(test_name: impl Into<String>, recording: JsonValue, run_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            test_name: test_name.into(),
            run_id: run_id.into(),
            recording,
            submitted_at: Utc::now(),
        }
    }

    /// File stem shared by the persisted recording and the compiled script
    pub fn file_stem(&self) -> String {
        safe_file_stem(&self.test_name)
    }
}

/// Derive a file stem from a free-form name
///
/// Every character outside `[A-Za-z0-9]` becomes `_` and the result is
/// lowercased. Distinct names can collide (`"A b"` and `"a-b"`); the later
/// artifact overwrites the earlier one.
pub fn safe_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Pipeline position of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStage {
    Queued,
    Persisting,
    Compiling,
    Executing,
    Reporting,
    Done,
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStage::Queued => "Queued",
            JobStage::Persisting => "Persisting",
            JobStage::Compiling => "Compiling",
            JobStage::Executing => "Executing",
            JobStage::Reporting => "Reporting",
            JobStage::Done => "Done",
        };
        f.write_str(name)
    }
}

/// Informational result of one pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResult {
    pub ok: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl StageResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            exit_code: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            exit_code: None,
        }
    }

    pub fn with_exit_code(mut self, exit_code: Option<i32>) -> Self {
        self.exit_code = exit_code;
        self
    }
}

/// A stage result tagged with the stage that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub stage: JobStage,
    #[serde(flatten)]
    pub result: StageResult,
}

/// Record of a job that reached `Done`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub job_id: Uuid,
    pub test_name: String,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stages: Vec<StageReport>,
}

impl JobOutcome {
    /// Starts an outcome for a job entering the slot
    pub fn begin(job: &Job) -> Self {
        Self {
            job_id: job.id,
            test_name: job.test_name.clone(),
            run_id: job.run_id.clone(),
            started_at: Utc::now(),
            finished_at: None,
            stages: Vec::new(),
        }
    }

    pub fn record(&mut self, stage: JobStage, result: StageResult) {
        self.stages.push(StageReport { stage, result });
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Stages that did not complete cleanly, in pipeline order
    pub fn failed_stages(&self) -> Vec<JobStage> {
        self.stages
            .iter()
            .filter(|report| !report.result.ok)
            .map(|report| report.stage)
            .collect()
    }

    /// Whether the given stage ran at all
    pub fn ran(&self, stage: JobStage) -> bool {
        self.stages.iter().any(|report| report.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("Checkout Flow #2"), "checkout_flow__2");
        assert_eq!(safe_file_stem("already_safe_01"), "already_safe_01");
        assert_eq!(safe_file_stem("Åbo"), "_bo");
    }

    #[test]
    fn test_colliding_names_share_a_stem() {
        assert_eq!(safe_file_stem("A b"), safe_file_stem("a-b"));
    }

    #[test]
    fn test_job_file_stem() {
        let job = Job::new("Login Test", serde_json::json!({}), "run-1");
        assert_eq!(job.file_stem(), "login_test");
    }

    #[test]
    fn test_outcome_tracks_failed_stages() {
        let job = Job::new("t", serde_json::json!({}), "r");
        let mut outcome = JobOutcome::begin(&job);
        outcome.record(JobStage::Persisting, StageResult::ok("saved"));
        outcome.record(
            JobStage::Executing,
            StageResult::failed("exit 3").with_exit_code(Some(3)),
        );
        let outcome = outcome.finish();

        assert!(outcome.finished_at.is_some());
        assert_eq!(outcome.failed_stages(), vec![JobStage::Executing]);
        assert!(outcome.ran(JobStage::Persisting));
        assert!(!outcome.ran(JobStage::Reporting));
    }

    #[test]
    fn test_stage_report_serializes_flat() {
        let report = StageReport {
            stage: JobStage::Executing,
            result: StageResult::failed("tests failed").with_exit_code(Some(1)),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stage"], "Executing");
        assert_eq!(json["ok"], false);
        assert_eq!(json["exitCode"], 1);
    }
}
