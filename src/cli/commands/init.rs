//! Init command - create project-local .shelter.toml

use crate::cli::args::InitArgs;
use crate::config::LOCAL_CONFIG_NAME;
use crate::error::{ShelterError, ShelterResult};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;

/// Template for project-local config
const INIT_TEMPLATE: &str = r#"# Shelter project configuration
# Settings here override your global config (~/.config/shelter/config.toml)

[manifest]
# path = "build/web/manifest.json"

[network]
# origin = "https://app.example.com"
# timeout_secs = 30
# concurrency = 4

[cache]
# dir = ".shelter-cache"
# ephemeral = false
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> ShelterResult<()> {
    let ctx = UiContext::detect();

    let target_dir = match args.path {
        Some(ref p) => p.clone(),
        None => {
            std::env::current_dir().map_err(|e| ShelterError::io("getting current directory", e))?
        }
    };

    let config_path = target_dir.join(LOCAL_CONFIG_NAME);

    if config_path.exists() && !args.force {
        return Err(ShelterError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    ensure_dir(&target_dir).await?;

    fs::write(&config_path, INIT_TEMPLATE)
        .await
        .map_err(|e| ShelterError::io(format!("writing {}", config_path.display()), e))?;

    ui::step_ok_detail(
        &ctx,
        "Created project config",
        &config_path.display().to_string(),
    );

    Ok(())
}

async fn ensure_dir(dir: &Path) -> ShelterResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| ShelterError::io(format!("creating directory {}", dir.display()), e))?;
    }
    Ok(())
}
