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

//! Binary entrypoint for the flvd download service.

use flvd_app::{AppResult, run_app};

/// Serves download and removal calls until SIGINT or SIGTERM.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
