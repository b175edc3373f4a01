//! Shared HTTP constants (headers, routes, problem type URIs).

use axum::http::HeaderMap;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

pub(crate) const ROUTE_DOWNLOAD: &str = "/v1/download";
pub(crate) const ROUTE_REMOVE: &str = "/v1/remove";
pub(crate) const ROUTE_HEALTH: &str = "/health";
pub(crate) const ROUTE_METRICS: &str = "/metrics";
/// Metrics label for requests that matched no route.
pub(crate) const ROUTE_UNMATCHED: &str = "unmatched";

pub(crate) const PROBLEM_INTERNAL: &str = "/problems/internal";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "/problems/bad-request";
pub(crate) const PROBLEM_CONFLICT: &str = "/problems/conflict";

pub(crate) const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Request identifier carried in `x-request-id`, or empty when absent.
pub(crate) fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(HEADER_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
