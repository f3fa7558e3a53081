//! Sync command - stage the shell and reconcile the cache

use crate::cli::args::SyncArgs;
use crate::config::Config;
use crate::error::ShelterResult;
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the sync command
pub async fn execute(args: SyncArgs, config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let worker = super::build_worker(config, args.manifest.as_deref(), args.ephemeral).await?;

    ui::intro(&ctx, "Shelter Sync");

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start("Staging shell resources...");
    let staged = match worker.handle_install().await {
        Ok(count) => count,
        Err(e) => {
            spinner.stop_error("Staging failed");
            return Err(e);
        }
    };
    spinner.stop(&format!("Staged {} shell resources", staged));

    spinner.start("Reconciling cache...");
    if let Err(e) = worker.handle_activate().await {
        spinner.stop_error("Reconciliation failed, cache discarded");
        return Err(e);
    }
    let cached = worker.stores().content.keys().await?.len();
    spinner.stop(&format!("Cache reconciled, {} entries", cached));

    ui::outro_success(&ctx, "Shell cache is up to date");
    Ok(())
}
