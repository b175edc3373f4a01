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

//! Shared test helpers used across flvd suites.
//! Layout: fixtures.rs (paths and shell stand-ins), fetcher.rs (recording fake client).

pub mod fetcher;
pub mod fixtures;

pub use fetcher::{FetchCall, RecordingFetcher};
