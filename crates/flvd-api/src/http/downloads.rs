//! Download and removal RPC handlers.
//!
//! Workflow calls run on a detached task: a caller that disconnects mid-call
//! does not cancel the external client run, and a panic inside the workflow
//! surfaces as a 500 instead of tearing down the connection task.

use std::future::Future;
use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use flvd_core::{DownloadError, DownloadResult, check_non_empty, check_title};
use flvd_telemetry::CallContext;
use tracing::{Instrument, Span, error};

use crate::http::errors::{ApiError, invalid_param};
use crate::models::{DownloadRequest, ProblemInvalidParam, RemoveRequest, StatusResponse};
use crate::state::ApiState;

pub(crate) async fn download(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(request) = payload?;
    if state.strict_inputs {
        reject_invalid(&[
            check_non_empty("url_base", &request.url_base),
            check_title(&request.title),
            check_non_empty("destination_dir", &request.destination_dir),
        ])?;
    }

    let workflow = Arc::clone(state.downloads.workflow());
    let status = run_detached("download", async move { workflow.download(request).await })
        .await?
        .map_err(|err| ApiError::from_workflow("download", &err))?;
    Ok(Json(StatusResponse::from(status)))
}

pub(crate) async fn remove(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<RemoveRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(request) = payload?;
    if state.strict_inputs {
        reject_invalid(&[
            check_title(&request.title),
            check_non_empty("destination_dir", &request.destination_dir),
        ])?;
    }

    let workflow = Arc::clone(state.downloads.workflow());
    let status = run_detached("remove", async move { workflow.remove(request).await })
        .await?
        .map_err(|err| ApiError::from_workflow("remove", &err))?;
    Ok(Json(StatusResponse::from(status)))
}

fn reject_invalid(checks: &[DownloadResult<()>]) -> Result<(), ApiError> {
    let params: Vec<ProblemInvalidParam> = checks
        .iter()
        .filter_map(|check| check.as_ref().err())
        .filter_map(|err| match err {
            DownloadError::InvalidInput { field, reason, .. } => Some(invalid_param(field, reason)),
            DownloadError::OutputBusy { .. } | DownloadError::OperationFailed { .. } => None,
        })
        .collect();
    if params.is_empty() {
        Ok(())
    } else {
        Err(ApiError::bad_request("request failed validation").with_invalid_params(params))
    }
}

/// Spawn `fut` with the caller's span and call context attached.
async fn run_detached<Fut, T>(operation: &'static str, fut: Fut) -> Result<T, ApiError>
where
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let call = CallContext::current();
    let task = async move {
        match call {
            Some(call) => call.scope(fut).await,
            None => fut.await,
        }
    }
    .instrument(Span::current());
    tokio::spawn(task).await.map_err(|err| {
        error!(operation, error = %err, "workflow task aborted");
        ApiError::internal(format!("{operation} failed"))
    })
}
