//! Status command - manifest, snapshot, and store state

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::error::ShelterResult;
use console::style;

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> ShelterResult<()> {
    let worker = super::build_worker(config, args.manifest.as_deref(), false).await?;

    let manifest = worker.manifest();
    let snapshot = worker.stores().snapshot.load().await?;
    let cached = worker.stores().content.keys().await?.len();
    let staged = worker.stores().staging.keys().await?.len();
    let missing = worker.missing_keys().await?.len();

    let snapshot_state = match &snapshot {
        Some(prior) if prior == manifest => "current".to_string(),
        Some(prior) => format!("stale ({} entries)", prior.len()),
        None => "none".to_string(),
    };

    match args.format {
        OutputFormat::Table => {
            println!("{}", style("Shelter Status").bold().cyan());
            println!();
            println!("{}", style("Deployment:").bold());
            println!("  Origin:    {}", worker.origin().as_str());
            println!("  Resources: {}", manifest.len());
            println!("  Shell:     {}", manifest.shell().len());
            println!();
            println!("{}", style("Stores:").bold());
            println!("  Snapshot:  {}", snapshot_state);
            println!("  Content:   {} cached, {} missing", cached, missing);
            println!("  Staged:    {}", staged);
        }
        OutputFormat::Json => {
            #[derive(serde::Serialize)]
            struct StatusJson<'a> {
                origin: &'a str,
                resources: usize,
                shell: usize,
                snapshot: String,
                cached: usize,
                missing: usize,
                staged: usize,
            }

            let status = StatusJson {
                origin: worker.origin().as_str(),
                resources: manifest.len(),
                shell: manifest.shell().len(),
                snapshot: snapshot_state,
                cached,
                missing,
                staged,
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        OutputFormat::Plain => {
            println!("origin={}", worker.origin().as_str());
            println!("resources={}", manifest.len());
            println!("shell={}", manifest.shell().len());
            println!("snapshot={}", snapshot_state);
            println!("cached={}", cached);
            println!("missing={}", missing);
            println!("staged={}", staged);
        }
    }

    Ok(())
}
