//! HTTP surface modules (router, handlers, middleware).

/// Shared constants and header names.
pub(crate) mod constants;
/// Download and removal RPC handlers.
pub(crate) mod downloads;
/// Problem response helpers.
pub(crate) mod errors;
/// Health and metrics endpoints.
pub(crate) mod health;
/// Router construction and server host.
pub(crate) mod router;
/// Metrics middleware for HTTP requests.
pub(crate) mod telemetry;
