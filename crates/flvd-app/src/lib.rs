#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! flvd application wiring.
//!
//! Layout: `bootstrap.rs` (service wiring and shutdown), `orchestrator.rs`
//! (download/remove workflow over the streaming client and filesystem),
//! `error.rs` (application errors).

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Application-level error type.
pub mod error;
/// Download orchestrator.
pub mod orchestrator;

pub use bootstrap::run_app;
pub use error::{AppError, AppResult};
pub use orchestrator::DownloadOrchestrator;
