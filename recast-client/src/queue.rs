//! Orchestrator queue endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use recast_core::dto::job::{HealthStatus, QueueStatus, SubmitAccepted, SubmitTest};

impl OrchestratorClient {
    /// Submit a recording for compilation, execution and reporting
    ///
    /// The orchestrator acknowledges immediately; the job runs later.
    ///
    /// # Returns
    /// The acknowledgment with the job's queue position
    pub async fn submit_test(&self, req: SubmitTest) -> Result<SubmitAccepted> {
        let url = format!("{}/api/run-test", self.base_url);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Read the current queue snapshot
    pub async fn queue_status(&self) -> Result<QueueStatus> {
        let url = format!("{}/api/queue-status", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Liveness probe
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientError;
    use axum::{Json, Router, http::StatusCode, routing::get, routing::post};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_submit_and_status() {
        let router = Router::new()
            .route(
                "/api/run-test",
                post(|| async { Json(json!({ "message": "queued", "position": 2 })) }),
            )
            .route(
                "/api/queue-status",
                get(|| async {
                    Json(json!({
                        "queueLength": 0,
                        "queueItems": [],
                        "currentRunning": null,
                        "isProcessing": false
                    }))
                }),
            );
        let client = OrchestratorClient::new(serve(router).await);

        let accepted = client
            .submit_test(SubmitTest::new("Login", json!({ "steps": [] }), "r1"))
            .await
            .unwrap();
        assert_eq!(accepted.position, 2);

        let status = client.queue_status().await.unwrap();
        assert!(!status.is_processing);
        assert!(status.recent.is_empty());
    }

    #[tokio::test]
    async fn test_rejection_carries_body() {
        let router = Router::new().route(
            "/api/run-test",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Missing TestName, Recording or TestRunId" })),
                )
            }),
        );
        let client = OrchestratorClient::new(serve(router).await);

        let err = client
            .submit_test(SubmitTest::default())
            .await
            .unwrap_err();
        assert!(err.is_client_error());
        assert!(matches!(err, ClientError::ApiError { message, .. } if message.contains("Missing TestName")));
    }
}
