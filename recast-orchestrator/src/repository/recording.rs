//! Recording Repository
//!
//! Persists submitted recordings where the compiler picks them up.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use recast_core::domain::job::Job;

/// Write the job's recording as pretty JSON to `<dir>/<file stem>.json`
///
/// A recording with the same file stem is overwritten.
pub async fn save(dir: &Path, job: &Job) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(format!("{}.json", job.file_stem()));
    let content =
        serde_json::to_string_pretty(&job.recording).context("Failed to serialize recording")?;

    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!("Saved recording: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_writes_pretty_json() {
        let dir = TempDir::new().unwrap();
        let job = Job::new("Checkout Flow", json!({ "title": "Checkout", "steps": [] }), "r1");

        let path = save(&dir.path().join("recordings"), &job).await.unwrap();

        assert_eq!(path.file_name().unwrap(), "checkout_flow.json");
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \"title\": \"Checkout\""));
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, job.recording);
    }

    #[tokio::test]
    async fn test_same_stem_overwrites() {
        let dir = TempDir::new().unwrap();
        let first = Job::new("A b", json!({ "title": "first" }), "r1");
        let second = Job::new("a-b", json!({ "title": "second" }), "r2");

        let first_path = save(dir.path(), &first).await.unwrap();
        let second_path = save(dir.path(), &second).await.unwrap();

        assert_eq!(first_path, second_path);
        let content = std::fs::read_to_string(&second_path).unwrap();
        assert!(content.contains("second"));
    }
}
