//! `download` and `remove` command handlers.

use anyhow::anyhow;
use flvd_api::models::{DownloadRequest, RemoveRequest, StatusResponse};
use serde::Serialize;

use crate::cli::{DownloadArgs, RemoveArgs};
use crate::client::{AppContext, CliError, CliResult, classify_problem};

pub(crate) async fn handle_download(
    ctx: &AppContext,
    args: DownloadArgs,
) -> CliResult<StatusResponse> {
    let request = DownloadRequest::new(args.url_base, args.title, args.destination_dir);
    post_call(ctx, "/v1/download", &request).await
}

pub(crate) async fn handle_remove(ctx: &AppContext, args: RemoveArgs) -> CliResult<StatusResponse> {
    let request = RemoveRequest::new(args.title, args.destination_dir);
    post_call(ctx, "/v1/remove", &request).await
}

async fn post_call<T: Serialize + Sync>(
    ctx: &AppContext,
    path: &str,
    body: &T,
) -> CliResult<StatusResponse> {
    let url = ctx
        .base_url
        .join(path)
        .map_err(|err| CliError::failure(anyhow!("invalid base URL: {err}")))?;

    let response = ctx
        .client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to {path} failed: {err}")))?;

    if !response.status().is_success() {
        return Err(classify_problem(response).await);
    }
    response
        .json::<StatusResponse>()
        .await
        .map_err(|err| CliError::failure(anyhow!("malformed response from {path}: {err}")))
}
