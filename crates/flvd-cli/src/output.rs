//! Status renderers.

use anyhow::anyhow;
use flvd_api::models::StatusResponse;
use flvd_core::{FetchStatus, RemoveStatus};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn render_status(
    operation: &str,
    response: &StatusResponse,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(response)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => {
            println!("{:<10} {:>6} MEANING", "OPERATION", "STATUS");
            println!(
                "{:<10} {:>6} {}",
                operation,
                response.status,
                status_meaning(operation, response.status)
            );
        }
    }
    Ok(())
}

/// Human-readable explanation of a status code for `operation`.
pub(crate) fn status_meaning(operation: &str, status: i32) -> &'static str {
    if operation == "remove" {
        return match RemoveStatus::from_code(status) {
            Some(RemoveStatus::Removed) => "file removed",
            Some(RemoveStatus::RemoveFailed) => "file exists but could not be deleted",
            Some(RemoveStatus::NotFound) => "no such file",
            None => "unknown removal status",
        };
    }
    match FetchStatus::from_code(status) {
        FetchStatus::SUCCESS => "stream fully retrieved",
        FetchStatus::FAILED => "client reported failure",
        FetchStatus::INCOMPLETE => "stream incomplete or client interrupted",
        FetchStatus::LAUNCH_FAILED => "client could not be started",
        _ => "client-specific failure code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meanings_depend_on_the_operation() {
        assert_eq!(status_meaning("remove", 2), "no such file");
        assert_eq!(
            status_meaning("download", 2),
            "stream incomplete or client interrupted"
        );
        assert_eq!(status_meaning("download", 42), "client-specific failure code");
        assert_eq!(status_meaning("remove", 9), "unknown removal status");
    }

    #[test]
    fn both_formats_render() {
        let response = StatusResponse {
            status: 0,
            outcome: "success".to_string(),
        };
        assert!(render_status("download", &response, OutputFormat::Table).is_ok());
        assert!(render_status("download", &response, OutputFormat::Json).is_ok());
    }
}
