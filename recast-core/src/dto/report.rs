//! Reporting-system DTOs
//!
//! The reporting system stores records as form entries wrapped in a
//! `{ "values": { ... } }` envelope, both when writing results and when
//! listing stored recordings.

use serde::{Deserialize, Serialize};

use crate::domain::report::TestReport;

/// Envelope for creating one form entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPayload<T> {
    pub values: T,
}

impl From<TestReport> for EntryPayload<TestReport> {
    fn from(report: TestReport) -> Self {
        Self { values: report }
    }
}

/// Response of listing entries of the recording form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingEntries {
    #[serde(default)]
    pub entries: Vec<EntryPayload<RecordingEntryValues>>,
}

/// Fields of a stored recording entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingEntryValues {
    #[serde(rename = "TestName", default)]
    pub test_name: Option<String>,
    /// The recording JSON document, stored as text
    #[serde(rename = "Recording", default)]
    pub recording: Option<String>,
}
