use crate::context::AppContext;
use anyhow::{Context, Result};
use launch_config::Config;
use launch_orchestration::RestoreOutcome;

pub async fn run(config: &Config) -> Result<()> {
    let app = AppContext::from_config(config)?;

    let outcomes = app
        .orchestrator
        .restore_original()
        .await
        .context("Failed to restore original installs")?;

    if outcomes.is_empty() {
        println!("No platform library found");
    }
    for (platform, outcome) in outcomes {
        let message = match outcome {
            RestoreOutcome::Restored => "original install restored",
            RestoreOutcome::NothingToRestore => "nothing to restore",
            RestoreOutcome::DiscardedStaleBackup => "kept current install, removed stale backup",
        };
        println!("✓ {}: {}", platform, message);
    }

    Ok(())
}
