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

//! Service configuration loaded once from `FLVD_*` environment variables.
//!
//! Layout: `model.rs` (typed settings), `validate.rs` (value parsers),
//! `loader.rs` (environment lookup and defaults).

pub mod error;
pub mod loader;
pub mod model;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::env;
pub use model::{
    FetcherKind, LogFormatSetting, MAX_CONCURRENT_FETCHES_LIMIT, SamePathPolicy, ServiceConfig,
};
