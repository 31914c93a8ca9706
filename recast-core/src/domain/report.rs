//! Test report domain types
//!
//! One `TestReport` is produced per executed test case and published to the
//! external reporting system. Field names on the wire follow that system's
//! form definition.

use serde::{Deserialize, Serialize};

/// Outcome of a single executed test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestReport {
    pub test_name: String,
    pub full_title: String,
    pub status: String,
    pub duration_ms: u64,
    pub run_time: String,
    pub file_name: String,
    pub suite_title: String,
    pub error_message: String,
    pub screenshot_base64: String,
    pub screenshot_missing: bool,
    pub test_run_id: String,
}

impl TestReport {
    pub fn is_failed(&self) -> bool {
        self.status == "failed"
    }
}
