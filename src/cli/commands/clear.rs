//! Clear command - wipe the named stores

use crate::cli::args::ClearArgs;
use crate::config::Config;
use crate::error::ShelterResult;
use crate::store::StoreSet;
use crate::ui::{self, UiContext};

/// Execute the clear command
pub async fn execute(args: ClearArgs, config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);

    let confirmed = ui::confirm(
        &ctx,
        "Delete all cached shell resources and the manifest snapshot?",
        false,
    )
    .await?;
    if !confirmed {
        ui::remark(&ctx, "Nothing cleared");
        return Ok(());
    }

    let dir = super::store_dir(config);
    let stores = StoreSet::open(&dir);
    stores.content.clear().await?;
    stores.staging.clear().await?;
    stores.snapshot.clear().await?;

    ui::step_ok_detail(&ctx, "Stores cleared", &dir.display().to_string());
    Ok(())
}
