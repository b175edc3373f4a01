//! Shared client utilities and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;
use flvd_api::models::ProblemDetails;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url};

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// HTTP client and target service passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
}

impl AppContext {
    /// Build a client that tags every call with `trace_id`.
    ///
    /// `timeout` of `None` leaves calls unbounded; downloads last as long as
    /// the stream.
    pub(crate) fn new(base_url: Url, timeout: Option<u64>, trace_id: &str) -> CliResult<Self> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
            CliError::failure(anyhow!("trace identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let mut builder = Client::builder().default_headers(default_headers);
        if let Some(secs) = timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

        Ok(Self { client, base_url })
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

/// Classify a non-success HTTP response into a CLI error.
pub(crate) async fn classify_problem(response: reqwest::Response) -> CliError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();

    let body_text = String::from_utf8_lossy(&bytes).to_string();
    let problem = serde_json::from_slice::<ProblemDetails>(&bytes).ok();

    let mut message = problem
        .as_ref()
        .and_then(|p| p.detail.clone())
        .unwrap_or_else(|| {
            problem
                .as_ref()
                .map_or_else(|| body_text.trim().to_string(), |p| p.title.clone())
        });
    if let Some(params) = problem.as_ref().and_then(|p| p.invalid_params.as_ref()) {
        for param in params {
            message.push_str(&format!("; {}: {}", param.pointer, param.message));
        }
    }

    if matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
    ) {
        CliError::validation(message)
    } else if problem.is_some() || !body_text.is_empty() {
        CliError::failure(anyhow!("{message} (status {status})"))
    } else {
        CliError::failure(anyhow!("request failed with status {status}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn exit_codes_split_validation_from_failure() {
        assert_eq!(CliError::validation("bad").exit_code(), 2);
        assert_eq!(CliError::failure(anyhow!("down")).exit_code(), 3);
        assert_eq!(CliError::validation("bad").display_message(), "bad");
    }

    #[test]
    fn parse_url_reports_invalid_input() {
        assert!(parse_url("http://127.0.0.1:7071").is_ok());
        assert!(parse_url("not a url").is_err_and(|err| err.contains("not a url")));
    }

    #[tokio::test]
    async fn conflict_problem_is_a_validation_error() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/busy");
            then.status(409).json_body(json!({
                "type": "/problems/conflict",
                "title": "conflict",
                "status": 409,
                "detail": "a download to /tmp/a.flv is already running"
            }));
        });

        let response = reqwest::get(server.url("/busy")).await?;
        let err = classify_problem(response).await;
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.display_message(),
            "a download to /tmp/a.flv is already running"
        );
        Ok(())
    }

    #[tokio::test]
    async fn invalid_params_are_listed_in_the_message() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/invalid");
            then.status(400).json_body(json!({
                "type": "/problems/bad-request",
                "title": "bad request",
                "status": 400,
                "detail": "request failed validation",
                "invalid_params": [{"pointer": "/title", "message": "path_separator"}]
            }));
        });

        let response = reqwest::get(server.url("/invalid")).await?;
        let err = classify_problem(response).await;
        assert_eq!(
            err.display_message(),
            "request failed validation; /title: path_separator"
        );
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_are_operational_failures() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/broken");
            then.status(500);
        });

        let response = reqwest::get(server.url("/broken")).await?;
        let err = classify_problem(response).await;
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("500"));
        Ok(())
    }
}
