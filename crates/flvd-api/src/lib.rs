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
#![allow(clippy::module_name_repetitions)]

//! Request router for the download service: an axum HTTP/JSON RPC surface
//! over the [`flvd_core::DownloadWorkflow`] seam.
//!
//! Layout: `models.rs` (wire types), `state.rs` (shared handler state),
//! `http/` (router, handlers, problem responses, middleware), `error.rs`
//! (server lifecycle errors).

pub mod error;
pub(crate) mod http;
pub mod models;
pub mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
pub use state::DownloadHandles;
