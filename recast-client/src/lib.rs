//! Recast HTTP Client
//!
//! Clients for the two HTTP services Recast talks to:
//! - The Recast orchestrator API (submit tests, read the queue, liveness)
//! - The Helix reporting system (login, form entries, stored recordings)
//!
//! It also turns a merged Mochawesome results document into per-test
//! reports and publishes them.
//!
//! # Example
//!
//! ```no_run
//! use recast_client::OrchestratorClient;
//! use recast_core::dto::job::SubmitTest;
//!
//! #[tokio::main]
//! async fn main() -> recast_client::Result<()> {
//!     let client = OrchestratorClient::new("http://localhost:3000");
//!
//!     let accepted = client
//!         .submit_test(SubmitTest::new("Login", serde_json::json!({ "steps": [] }), "run-1"))
//!         .await?;
//!
//!     println!("Queued at position {}", accepted.position);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod helix;
mod queue;
pub mod report;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use helix::{HelixClient, HelixConfig};
pub use report::{
    MergedResults, PublishSummary, build_reports, publish, publish_results, purge_artifacts,
};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Recast orchestrator API
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    /// Base URL of the orchestrator (e.g., "http://localhost:3000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl OrchestratorClient {
    /// Create a new orchestrator client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the orchestrator API (e.g., "http://localhost:3000")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new orchestrator client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the orchestrator
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

/// Turn a non-success response into an `ApiError` carrying the body text
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OrchestratorClient::new("http://localhost:3000");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = OrchestratorClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }
}
