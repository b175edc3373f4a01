//! Per-request middleware: opens the call context and counts the request
//! under its matched route.
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use axum::extract::MatchedPath;
use axum::http::Request;
use flvd_telemetry::{CallContext, Metrics};
use tower::{Layer, Service};
use tracing::Span;

use crate::http::constants::{ROUTE_UNMATCHED, request_id};

/// Counts requests per matched route and status code.
#[derive(Clone)]
pub(crate) struct HttpMetricsLayer {
    telemetry: Metrics,
}

impl HttpMetricsLayer {
    pub(crate) const fn new(telemetry: Metrics) -> Self {
        Self { telemetry }
    }
}

impl<S> Layer<S> for HttpMetricsLayer {
    type Service = HttpMetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpMetricsService {
            inner,
            telemetry: self.telemetry.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct HttpMetricsService<S> {
    inner: S,
    telemetry: Metrics,
}

impl<S, B> Service<Request<B>> for HttpMetricsService<S>
where
    S: Service<Request<B>, Response = axum::response::Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        // Raw paths would make the label set unbounded.
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map_or_else(|| ROUTE_UNMATCHED.to_string(), |m| m.as_str().to_string());
        let call = CallContext::new(&request_id(req.headers()), &route);
        // Replace the raw path on the enclosing request span with the matched route.
        call.record_on(&Span::current());
        let telemetry = self.telemetry.clone();
        let fut = self.inner.call(req);

        Box::pin(call.scope(async move {
            let response = fut.await?;
            telemetry.inc_http_request(&route, response.status().as_u16());
            Ok(response)
        }))
    }
}
