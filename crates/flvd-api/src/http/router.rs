//! Router construction and server host for the API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::Request,
    routing::{get, post},
};
use flvd_telemetry::{Metrics, build_sha};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{Span, info};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::constants::{
    ROUTE_DOWNLOAD, ROUTE_HEALTH, ROUTE_METRICS, ROUTE_REMOVE, request_id,
};
use crate::http::downloads::{download, remove};
use crate::http::health::{health, metrics};
use crate::http::telemetry::HttpMetricsLayer;
use crate::state::{ApiState, DownloadHandles};

/// Axum router wrapper that hosts the download RPC surface.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Construct the router over the supplied workflow handles.
    ///
    /// With `strict_inputs` set, requests whose fields cannot compose into a
    /// single output file inside the destination are refused with a 400
    /// before the workflow runs.
    #[must_use]
    pub fn new(downloads: DownloadHandles, telemetry: Metrics, strict_inputs: bool) -> Self {
        let state = Arc::new(ApiState::new(downloads, telemetry.clone(), strict_inputs));
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id(request.headers()),
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(telemetry));

        let router = Router::new()
            .route(ROUTE_HEALTH, get(health))
            .route(ROUTE_METRICS, get(metrics))
            .route(ROUTE_DOWNLOAD, post(download))
            .route(ROUTE_REMOVE, post(remove))
            .layer(layered)
            .with_state(state);

        Self { router }
    }

    /// Hand out the configured router, e.g. to mount it elsewhere.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Bind `addr` and serve until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Bind`] when the listener cannot be bound and
    /// [`ApiServerError::Serve`] when the server loop fails.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// In-flight requests are allowed to finish after `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Serve`] when the server loop fails.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(local) = listener.local_addr() {
            info!(addr = %local, "starting api");
        }
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }
}
