//! Job DTOs for the orchestrator API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::job::{Job, JobOutcome, JobStage};

/// Request to queue a recording for compilation, execution and reporting
///
/// Every field is optional at the decoding level so that a missing field is
/// reported as a validation error instead of a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitTest {
    #[serde(rename = "TestName", default, skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
    #[serde(rename = "Recording", default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<JsonValue>,
    /// Accepted as a string or a number
    #[serde(rename = "TestRunId", default, skip_serializing_if = "Option::is_none")]
    pub test_run_id: Option<JsonValue>,
}

/// Message returned when a submission lacks a required field
pub const MISSING_FIELDS: &str = "Missing TestName, Recording or TestRunId";

impl SubmitTest {
    pub fn new(test_name: impl Into<String>, recording: JsonValue, run_id: impl Into<String>) -> Self {
        Self {
            test_name: Some(test_name.into()),
            recording: Some(recording),
            test_run_id: Some(JsonValue::String(run_id.into())),
        }
    }

    /// Validate the request and turn it into a queued job
    ///
    /// Empty strings and JSON `null` count as absent.
    pub fn into_job(self) -> Result<Job, String> {
        let test_name = self
            .test_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| MISSING_FIELDS.to_string())?;

        let recording = self
            .recording
            .filter(|recording| !recording.is_null())
            .ok_or_else(|| MISSING_FIELDS.to_string())?;

        let run_id = match self.test_run_id {
            Some(JsonValue::String(id)) if !id.is_empty() => id,
            Some(JsonValue::Number(id)) => id.to_string(),
            _ => return Err(MISSING_FIELDS.to_string()),
        };

        Ok(Job::new(test_name, recording, run_id))
    }
}

/// Acknowledgment of an accepted submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAccepted {
    pub message: String,
    /// Number of jobs ahead of this one, including a running job
    pub position: usize,
}

/// Identity of a queued job as shown in the status report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    #[serde(rename = "TestName")]
    pub test_name: String,
    #[serde(rename = "TestRunId")]
    pub test_run_id: String,
}

impl From<&Job> for QueueItem {
    fn from(job: &Job) -> Self {
        Self {
            test_name: job.test_name.clone(),
            test_run_id: job.run_id.clone(),
        }
    }
}

/// The job currently occupying the orchestrator slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningJob {
    #[serde(rename = "TestName")]
    pub test_name: String,
    #[serde(rename = "TestRunId")]
    pub test_run_id: String,
    pub stage: JobStage,
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
}

impl RunningJob {
    pub fn start(job: &Job) -> Self {
        Self {
            test_name: job.test_name.clone(),
            test_run_id: job.run_id.clone(),
            stage: JobStage::Queued,
            started_at: Utc::now(),
        }
    }
}

/// Snapshot of the orchestrator queue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub queue_length: usize,
    pub queue_items: Vec<QueueItem>,
    pub current_running: Option<RunningJob>,
    pub is_processing: bool,
    #[serde(default)]
    pub recent: Vec<JobOutcome>,
}

/// Liveness probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
