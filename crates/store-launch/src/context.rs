//! Composition root: wires the configured collaborators together

use anyhow::{Context, Result};
use game_process::SystemProcessInspector;
use launch_config::{Config, LaunchSetup};
use launch_orchestration::{DirectoryVersionRepository, LaunchOrchestrator, LinkManager};
use std::sync::Arc;
use tracing::debug;

/// A ready orchestrator plus the setup it was built from
pub struct AppContext {
    pub setup: LaunchSetup,
    pub orchestrator: LaunchOrchestrator,
}

impl AppContext {
    pub fn from_config(config: &Config) -> Result<Self> {
        let setup = LaunchSetup::from_config(config).context("Failed to resolve configuration")?;
        debug!("Versions directory: {}", setup.versions_dir.display());

        let orchestrator = LaunchOrchestrator::new(
            setup.strategies.clone(),
            Arc::new(DirectoryVersionRepository::new(&setup.versions_dir)),
            Arc::new(SystemProcessInspector::new()),
            LinkManager::new(),
            setup.settings.clone(),
        );

        Ok(Self {
            setup,
            orchestrator,
        })
    }
}
