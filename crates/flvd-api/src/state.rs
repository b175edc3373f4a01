//! Shared handler state.

use std::sync::Arc;

use flvd_core::{DownloadInspector, DownloadWorkflow};
use flvd_telemetry::Metrics;

/// Workflow and inspector handles backing the RPC handlers.
#[derive(Clone)]
pub struct DownloadHandles {
    workflow: Arc<dyn DownloadWorkflow>,
    inspector: Arc<dyn DownloadInspector>,
}

impl DownloadHandles {
    /// Construct a handle pair from shared workflow and inspector traits.
    #[must_use]
    pub fn new(workflow: Arc<dyn DownloadWorkflow>, inspector: Arc<dyn DownloadInspector>) -> Self {
        Self {
            workflow,
            inspector,
        }
    }

    /// Accessor for the workflow implementation.
    #[must_use]
    pub const fn workflow(&self) -> &Arc<dyn DownloadWorkflow> {
        &self.workflow
    }

    /// Accessor for the inspector implementation.
    #[must_use]
    pub const fn inspector(&self) -> &Arc<dyn DownloadInspector> {
        &self.inspector
    }
}

pub(crate) struct ApiState {
    pub(crate) downloads: DownloadHandles,
    pub(crate) telemetry: Metrics,
    pub(crate) strict_inputs: bool,
}

impl ApiState {
    pub(crate) const fn new(downloads: DownloadHandles, telemetry: Metrics, strict_inputs: bool) -> Self {
        Self {
            downloads,
            telemetry,
            strict_inputs,
        }
    }
}
