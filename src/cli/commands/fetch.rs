//! Fetch command - resolve one request through the interception policy

use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::{ShelterError, ShelterResult};
use crate::ui::{self, UiContext};
use crate::worker::{FetchOutcome, Request, ResponseSource};
use tokio::fs;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let worker = super::build_worker(config, args.manifest.as_deref(), false).await?;

    let request = Request::new(args.method.clone(), args.url.clone());
    match worker.handle_fetch(&request).await? {
        FetchOutcome::PassThrough => {
            ui::step_info(
                &ctx,
                "Not intercepted, request falls through to the network stack",
            );
        }
        FetchOutcome::Response {
            key,
            source,
            resource,
        } => {
            let provenance = match source {
                ResponseSource::Cache => "cache",
                ResponseSource::Network => "network",
            };
            ui::step_ok_detail(
                &ctx,
                &format!(
                    "{} ({} bytes, status {})",
                    key,
                    resource.body.len(),
                    resource.status
                ),
                provenance,
            );

            if let Some(output) = args.output {
                fs::write(&output, &resource.body)
                    .await
                    .map_err(|e| ShelterError::io(format!("writing {}", output.display()), e))?;
                ui::step_ok_detail(&ctx, "Body written", &output.display().to_string());
            }
        }
    }

    Ok(())
}
