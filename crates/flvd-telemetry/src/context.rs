//! Process span and per-call context.
//!
//! The `app` span lives as long as the service does; its `mode` field moves
//! from `serve` to `draining` when shutdown begins. Each RPC call runs inside
//! a [`CallContext`] so orchestrator logs name the HTTP call that started
//! them, including after the handler moves the work onto a spawned task.

use std::future::Future;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{Span, span::Entered};

use crate::init::build_sha;

static APP_SPAN: OnceCell<Span> = OnceCell::new();

/// Keeps the process-wide `app` span entered on the current thread.
pub struct AppSpanGuard {
    _entered: Entered<'static>,
}

impl AppSpanGuard {
    /// Enter the `app` span, creating it on first use, with `mode` recorded.
    #[must_use]
    pub fn enter(mode: &str) -> Self {
        let span = APP_SPAN.get_or_init(|| {
            tracing::info_span!("app", mode = tracing::field::Empty, build_sha = %build_sha())
        });
        span.record("mode", mode);
        Self {
            _entered: span.enter(),
        }
    }
}

/// Update the `mode` of the `app` span from any task.
///
/// A no-op until [`AppSpanGuard::enter`] has created the span.
pub fn set_app_mode(mode: &str) {
    if let Some(span) = APP_SPAN.get() {
        span.record("mode", mode);
    }
}

/// Identity of the RPC call being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    request_id: Arc<str>,
    route: Arc<str>,
}

tokio::task_local! {
    static CALL: CallContext;
}

impl CallContext {
    /// Context for a call carrying `request_id` on the matched `route`.
    #[must_use]
    pub fn new(request_id: &str, route: &str) -> Self {
        Self {
            request_id: Arc::from(request_id),
            route: Arc::from(route),
        }
    }

    /// Context of the call the current task is serving.
    #[must_use]
    pub fn current() -> Option<Self> {
        CALL.try_with(Clone::clone).ok()
    }

    /// `x-request-id` of the call.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Matched route template, or `unmatched`.
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Fill the `request_id` and `route` fields of a span declared with them.
    pub fn record_on(&self, span: &Span) {
        span.record("request_id", self.request_id());
        span.record("route", self.route());
    }

    /// Run `fut` with this context visible through [`CallContext::current`].
    pub async fn scope<Fut>(self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        CALL.scope(self, fut).await
    }
}
