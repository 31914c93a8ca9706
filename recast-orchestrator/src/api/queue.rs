//! Queue API Handlers
//!
//! Test submission and queue status.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use recast_core::dto::job::{QueueStatus, SubmitAccepted, SubmitTest};

use crate::api::error::{ApiError, ApiResult};
use crate::service::Orchestrator;

/// POST /api/run-test
/// Queue a recording; answers before the job runs
pub async fn submit_test(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<SubmitTest>, JsonRejection>,
) -> ApiResult<Json<SubmitAccepted>> {
    let Json(req) = payload?;
    let job = req.into_job().map_err(ApiError::BadRequest)?;
    let test_name = job.test_name.clone();

    let position = orchestrator.submit(job);

    Ok(Json(SubmitAccepted {
        message: format!("Received {}. Queued for execution.", test_name),
        position,
    }))
}

/// GET /api/queue-status
/// Current queue, running job and recent outcomes
pub async fn queue_status(State(orchestrator): State<Arc<Orchestrator>>) -> Json<QueueStatus> {
    tracing::debug!("Reading queue status");
    Json(orchestrator.status())
}
