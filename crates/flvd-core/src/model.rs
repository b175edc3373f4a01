//! Request types and the deterministic output naming rule.
//!
//! # Design
//! - Naming is purely textual: `url = url_base ++ title` and
//!   `output = destination_dir ++ title ++ ".flv"`. No escaping, no separator
//!   insertion. Callers supply components that compose into valid values.
//! - The output path is the only link between a download and a later removal.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DownloadError, DownloadResult};

/// Extension appended to every output file.
pub const OUTPUT_EXTENSION: &str = ".flv";

/// Arguments of a single download call. Constructed per call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Stream address prefix; the title is appended verbatim.
    pub url_base: String,
    /// Stream title, used for both the URL suffix and the output file stem.
    pub title: String,
    /// Destination directory prefix; expected to exist and be writable.
    pub destination_dir: String,
}

impl DownloadRequest {
    /// Build a request from its three components.
    #[must_use]
    pub fn new(
        url_base: impl Into<String>,
        title: impl Into<String>,
        destination_dir: impl Into<String>,
    ) -> Self {
        Self {
            url_base: url_base.into(),
            title: title.into(),
            destination_dir: destination_dir.into(),
        }
    }

    /// Stream address handed to the external client.
    #[must_use]
    pub fn stream_url(&self) -> String {
        stream_url(&self.url_base, &self.title)
    }

    /// Output file the external client writes to.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        output_path(&self.destination_dir, &self.title)
    }

    /// Removal request targeting the file this download produces.
    #[must_use]
    pub fn removal(&self) -> RemoveRequest {
        RemoveRequest::new(self.title.clone(), self.destination_dir.clone())
    }
}

/// Arguments of a single removal call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveRequest {
    /// Title of the earlier download.
    pub title: String,
    /// Destination directory prefix used by the earlier download.
    pub destination_dir: String,
}

impl RemoveRequest {
    /// Build a removal request.
    #[must_use]
    pub fn new(title: impl Into<String>, destination_dir: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            destination_dir: destination_dir.into(),
        }
    }

    /// Output file a matching download would have produced.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        output_path(&self.destination_dir, &self.title)
    }
}

/// Compose the stream address as the literal concatenation `url_base ++ title`.
#[must_use]
pub fn stream_url(url_base: &str, title: &str) -> String {
    let mut url = String::with_capacity(url_base.len() + title.len());
    url.push_str(url_base);
    url.push_str(title);
    url
}

/// Compose the output path as `destination_dir ++ title ++ ".flv"`.
#[must_use]
pub fn output_path(destination_dir: &str, title: &str) -> PathBuf {
    PathBuf::from(format!("{destination_dir}{title}{OUTPUT_EXTENSION}"))
}

/// Reject titles that cannot name a single file inside the destination.
///
/// # Errors
///
/// Returns `DownloadError::InvalidInput` for empty titles, path separators,
/// NUL bytes, and the `.`/`..` directory entries.
pub fn check_title(title: &str) -> DownloadResult<()> {
    let reason = if title.is_empty() {
        Some("empty")
    } else if title.contains(['/', '\\']) {
        Some("path_separator")
    } else if title.contains('\0') {
        Some("nul_byte")
    } else if matches!(title, "." | "..") {
        Some("directory_entry")
    } else {
        None
    };
    reason.map_or(Ok(()), |reason| {
        Err(DownloadError::InvalidInput {
            field: "title",
            reason,
            value: Some(title.to_string()),
        })
    })
}

/// Reject empty values for the named field.
///
/// # Errors
///
/// Returns `DownloadError::InvalidInput` when `value` is empty.
pub fn check_non_empty(field: &'static str, value: &str) -> DownloadResult<()> {
    if value.is_empty() {
        return Err(DownloadError::InvalidInput {
            field,
            reason: "empty",
            value: None,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn stream_url_is_literal_concatenation() {
        let request = DownloadRequest::new("http://host/stream/", "clip1", "/tmp/out/");
        assert_eq!(request.stream_url(), "http://host/stream/clip1");
        assert_eq!(request.output_path(), Path::new("/tmp/out/clip1.flv"));
    }

    #[test]
    fn naming_performs_no_escaping() {
        let request = DownloadRequest::new("rtmp://host/app?x=", "a b&c%20", "/data/");
        assert_eq!(request.stream_url(), "rtmp://host/app?x=a b&c%20");
        assert_eq!(request.output_path(), Path::new("/data/a b&c%20.flv"));
    }

    #[test]
    fn naming_does_not_insert_separators() {
        assert_eq!(output_path("/tmp/out", "clip1"), Path::new("/tmp/outclip1.flv"));
        assert_eq!(stream_url("", ""), "");
        assert_eq!(output_path("", ""), Path::new(".flv"));
    }

    #[test]
    fn download_and_removal_share_output_path() {
        let download = DownloadRequest::new("http://host/", "show", "/srv/media/");
        let removal = RemoveRequest::new("show", "/srv/media/");
        assert_eq!(download.removal(), removal);
        assert_eq!(download.output_path(), removal.output_path());
    }

    #[test]
    fn check_title_flags_unsafe_names() {
        assert!(check_title("clip1").is_ok());
        assert!(check_title("clip.part1").is_ok());
        for title in ["", "a/b", "a\\b", "nul\0", ".", ".."] {
            let err = check_title(title).expect_err("title should be rejected");
            assert!(matches!(
                err,
                DownloadError::InvalidInput { field: "title", .. }
            ));
        }
    }

    #[test]
    fn check_non_empty_reports_field() {
        assert!(check_non_empty("url_base", "rtmp://host/").is_ok());
        match check_non_empty("destination_dir", "") {
            Err(DownloadError::InvalidInput { field, reason, .. }) => {
                assert_eq!(field, "destination_dir");
                assert_eq!(reason, "empty");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn requests_serialize_with_snake_case_fields() -> anyhow::Result<()> {
        let request = DownloadRequest::new("http://host/", "clip", "/tmp/");
        let value = serde_json::to_value(&request)?;
        assert_eq!(value["url_base"], "http://host/");
        assert_eq!(value["destination_dir"], "/tmp/");
        Ok(())
    }
}
