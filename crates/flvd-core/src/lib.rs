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

//! Transport-agnostic download interfaces and DTOs.
//!
//! Layout: `model.rs` (requests and the output naming rule), `status.rs`
//! (status-code taxonomy), `service.rs` (fetcher and workflow traits),
//! `error.rs` (core error type).

pub mod error;
pub mod model;
pub mod service;
pub mod status;

pub use error::{DownloadError, DownloadResult};
pub use model::{
    DownloadRequest, OUTPUT_EXTENSION, RemoveRequest, check_non_empty, check_title, output_path,
    stream_url,
};
pub use service::{DownloadInspector, DownloadWorkflow, StreamFetcher};
pub use status::{FetchStatus, RemoveStatus};
