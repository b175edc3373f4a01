//! Command handlers.

pub(crate) mod downloads;
