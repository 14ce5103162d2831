use crate::context::AppContext;
use anyhow::{Context, Result};
use launch_config::Config;

pub async fn run(config: &Config) -> Result<()> {
    let app = AppContext::from_config(config)?;

    let removed = app
        .orchestrator
        .delete_managed_links()
        .await
        .context("Failed to remove managed links")?;

    println!("✓ Removed {} managed link(s)", removed);
    Ok(())
}
