//! RFC9457-style API error wrapper.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use flvd_core::DownloadError;
use tracing::error;

use crate::http::constants::{PROBLEM_BAD_REQUEST, PROBLEM_CONFLICT, PROBLEM_INTERNAL};
use crate::models::{ProblemDetails, ProblemInvalidParam};

/// Structured API error with optional RFC9457 fields.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) kind: &'static str,
    title: &'static str,
    detail: Option<String>,
    pub(crate) invalid_params: Option<Vec<ProblemInvalidParam>>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
            invalid_params: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn with_invalid_params(mut self, params: Vec<ProblemInvalidParam>) -> Self {
        self.invalid_params = Some(params);
        self
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(message)
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request").with_detail(detail)
    }

    pub(crate) fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, PROBLEM_CONFLICT, "conflict").with_detail(detail)
    }

    /// Map a workflow fault onto a problem response.
    pub(crate) fn from_workflow(operation: &'static str, err: &anyhow::Error) -> Self {
        match err.downcast_ref::<DownloadError>() {
            Some(DownloadError::OutputBusy { path }) => Self::conflict(format!(
                "a download to {} is already running",
                path.display()
            )),
            Some(DownloadError::InvalidInput { field, reason, .. }) => {
                Self::bad_request("request failed validation").with_invalid_params(vec![
                    invalid_param(field, reason),
                ])
            }
            Some(DownloadError::OperationFailed { .. }) | None => {
                error!(operation, error = %err, cause = ?err.source(), "workflow fault");
                Self::internal(format!("{operation} failed"))
            }
        }
    }
}

pub(crate) fn invalid_param(field: &str, reason: &str) -> ProblemInvalidParam {
    ProblemInvalidParam {
        pointer: format!("/{field}"),
        message: reason.to_string(),
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            invalid_params: self.invalid_params,
        };
        (self.status, Json(body)).into_response()
    }
}
