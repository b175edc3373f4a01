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

//! Streaming-client adapters: a process-backed fetcher for
//! `flvstreamer`/`rtmpdump`-compatible binaries and an in-memory stub.

pub mod error;
/// Process-backed fetcher.
pub mod process;
/// In-memory fetcher for smoke runs and tests.
pub mod stub;

pub use error::{StreamerError, StreamerResult};
pub use process::{DEFAULT_BINARY, ProcessFetcher};
pub use stub::StubFetcher;
