//! Offline command - populate the cache with every manifest resource

use crate::cli::args::OfflineArgs;
use crate::config::Config;
use crate::error::ShelterResult;
use crate::ui::{self, UiContext};
use indicatif::{ProgressBar, ProgressStyle};

/// Execute the offline command
pub async fn execute(args: OfflineArgs, config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let worker = super::build_worker(config, args.manifest.as_deref(), false).await?;

    let missing = worker.missing_keys().await?;
    if missing.is_empty() {
        ui::step_ok(&ctx, "All manifest resources are already cached");
        return Ok(());
    }

    let bar = if ctx.use_fancy_output() {
        let bar = ProgressBar::new(missing.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.cyan} Downloading  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .progress_chars("━╸─"),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(bar)
    } else {
        println!("Downloading {} resources...", missing.len());
        None
    };

    for key in &missing {
        if let Some(ref bar) = bar {
            bar.set_message(key.clone());
        }
        let result = worker.cache_key(key).await;
        if result.is_err() {
            if let Some(ref bar) = bar {
                bar.abandon_with_message(format!("Failed on {}", key));
            }
            return result;
        }
        if let Some(ref bar) = bar {
            bar.inc(1);
        }
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    ui::outro_success(
        &ctx,
        &format!(
            "Cached {} resources, the shell is fully available offline",
            missing.len()
        ),
    );
    Ok(())
}
