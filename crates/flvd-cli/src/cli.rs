//! Argument parsing and command dispatch.

use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliResult, parse_url};
use crate::commands::downloads::{handle_download, handle_remove};
use crate::output::render_status;

const DEFAULT_API_URL: &str = "http://127.0.0.1:7071";

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code: `0` for status 0, `1` for any other status, `2` for
/// validation errors, `3` for operational failures.
pub async fn run() -> i32 {
    run_with(Cli::parse()).await
}

pub(crate) async fn run_with(cli: Cli) -> i32 {
    let trace_id = Uuid::new_v4().to_string();
    match dispatch(cli, &trace_id).await {
        Ok(0) => 0,
        Ok(_) => 1,
        Err(err) => {
            eprintln!("error: {} (trace id {trace_id})", err.display_message());
            err.exit_code()
        }
    }
}

/// Run the command and hand back the service status code.
async fn dispatch(cli: Cli, trace_id: &str) -> CliResult<i32> {
    let ctx = AppContext::new(cli.api_url, cli.timeout, trace_id)?;
    let (operation, response) = match cli.command {
        Command::Download(args) => ("download", handle_download(&ctx, args).await?),
        Command::Remove(args) => ("remove", handle_remove(&ctx, args).await?),
    };
    tracing::debug!(operation, status = response.status, trace_id, "call finished");
    render_status(operation, &response, cli.output)?;
    Ok(response.status)
}

#[derive(Parser)]
#[command(name = "flvdctl", about = "Command-line client for the flvd download service")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "FLVD_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "FLVD_HTTP_TIMEOUT_SECS",
        help = "Request timeout in seconds; unset waits for the stream to end"
    )]
    pub(crate) timeout: Option<u64>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch `URL_BASE ++ TITLE` into `DESTINATION_DIR ++ TITLE ++ ".flv"`.
    Download(DownloadArgs),
    /// Delete the file a matching download produced.
    Remove(RemoveArgs),
}

#[derive(Args)]
pub(crate) struct DownloadArgs {
    pub(crate) url_base: String,
    pub(crate) title: String,
    pub(crate) destination_dir: String,
}

#[derive(Args)]
pub(crate) struct RemoveArgs {
    pub(crate) title: String,
    pub(crate) destination_dir: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    fn parse(args: &[&str]) -> Result<Cli> {
        Ok(Cli::try_parse_from(args)?)
    }

    #[test]
    fn download_arguments_are_positional() -> Result<()> {
        let cli = parse(&[
            "flvdctl",
            "--output",
            "json",
            "download",
            "rtmp://host/live/",
            "show",
            "/tmp/out/",
        ])?;
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.timeout, None);
        let Command::Download(args) = cli.command else {
            anyhow::bail!("expected download command");
        };
        assert_eq!(args.url_base, "rtmp://host/live/");
        assert_eq!(args.title, "show");
        assert_eq!(args.destination_dir, "/tmp/out/");
        Ok(())
    }

    #[test]
    fn remove_requires_both_arguments() {
        assert!(Cli::try_parse_from(["flvdctl", "remove", "show"]).is_err());
        assert!(Cli::try_parse_from(["flvdctl", "remove", "show", "/tmp/"]).is_ok());
    }

    #[tokio::test]
    async fn exit_code_reflects_service_status() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/v1/remove");
            then.status(200)
                .json_body(json!({"status": 2, "outcome": "not_found"}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/v1/download");
            then.status(200)
                .json_body(json!({"status": 0, "outcome": "success"}));
        });
        let base = server.base_url();

        let remove = parse(&["flvdctl", "--api-url", &base, "remove", "t", "/tmp/"])?;
        assert_eq!(run_with(remove).await, 1);

        let download = parse(&["flvdctl", "--api-url", &base, "download", "u/", "t", "/tmp/"])?;
        assert_eq!(run_with(download).await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn exit_code_separates_validation_and_transport_failures() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/v1/download");
            then.status(409).json_body(json!({
                "type": "/problems/conflict",
                "title": "conflict",
                "status": 409
            }));
        });
        let base = server.base_url();

        let busy = parse(&["flvdctl", "--api-url", &base, "download", "u/", "t", "/tmp/"])?;
        assert_eq!(run_with(busy).await, 2);

        let unreachable = parse(&[
            "flvdctl",
            "--api-url",
            "http://127.0.0.1:1",
            "remove",
            "t",
            "/tmp/",
        ])?;
        assert_eq!(run_with(unreachable).await, 3);
        Ok(())
    }
}
