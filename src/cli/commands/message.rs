//! Message command - deliver a raw worker message

use crate::cli::args::MessageArgs;
use crate::config::Config;
use crate::error::ShelterResult;
use crate::ui::{self, UiContext};

/// Execute the message command
pub async fn execute(args: MessageArgs, config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let worker = super::build_worker(config, args.manifest.as_deref(), false).await?;

    worker.handle_message(&args.text).await?;
    ui::step_ok(&ctx, &format!("Delivered '{}'", args.text));
    Ok(())
}
