//! Per-platform launch strategies.
//!
//! A [`LaunchStrategy`] knows where a platform keeps its library, how the
//! canonical install directory is prepared and which arguments the native
//! executable needs. Dispatch over platforms is an explicit match on
//! [`Strategy`].

mod epic;
mod steam;

pub use epic::{EpicConfig, EpicStrategy};
pub use steam::{SteamConfig, SteamStrategy};

use crate::discovery::LibraryDiscovery;
use crate::error::{Error, Result};
use crate::install::{self, BACKUP_SUFFIX, InstallSlot, RestoreOutcome};
use crate::link::LinkManager;
use crate::options::{LaunchOptions, Platform};
use crate::version::VersionRepository;
use async_trait::async_trait;
use game_process::Command;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the game lives inside a library root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallLayout {
    /// Name of the canonical install directory inside the library root
    pub install_dir_name: String,
    /// Executable path relative to the install directory
    pub executable: PathBuf,
}

impl InstallLayout {
    /// Create a layout
    pub fn new(install_dir_name: impl Into<String>, executable: impl Into<PathBuf>) -> Self {
        Self {
            install_dir_name: install_dir_name.into(),
            executable: executable.into(),
        }
    }

    /// File name of the executable, as it appears in the process table
    pub fn executable_name(&self) -> String {
        self.executable
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.executable.to_string_lossy().into_owned())
    }

    /// Entry names that mark a library root as holding this game
    pub fn wanted_entries(&self) -> Vec<String> {
        vec![
            self.install_dir_name.clone(),
            format!("{}{}", self.install_dir_name, BACKUP_SUFFIX),
        ]
    }

    /// The install slot of this game inside `library_root`
    pub fn slot(&self, library_root: &Path) -> InstallSlot {
        InstallSlot::new(library_root, self.install_dir_name.clone())
    }
}

/// Capability interface implemented once per distribution platform
#[async_trait]
pub trait LaunchStrategy: Send + Sync {
    /// Platform served by this strategy
    fn platform(&self) -> Platform;

    /// Install layout of the game on this platform
    fn layout(&self) -> &InstallLayout;

    /// Candidate library roots, most likely first
    async fn library_candidates(&self) -> Vec<PathBuf>;

    /// Find the library root holding this game among the candidates
    async fn locate_library(&self, discovery: &dyn LibraryDiscovery) -> Option<PathBuf> {
        let candidates = self.library_candidates().await;
        debug!("{} library candidates: {:?}", self.platform(), candidates);
        discovery
            .find_library_root(&candidates, &self.layout().wanted_entries())
            .await
    }

    /// Build the platform-specific command for `executable`
    fn launch_command(&self, executable: &Path, install_dir: &Path, options: &LaunchOptions) -> Command;

    /// Prepare the canonical install directory for `options` and return it
    async fn prepare(
        &self,
        options: &LaunchOptions,
        library_root: &Path,
        versions: &dyn VersionRepository,
        links: &LinkManager,
    ) -> Result<PathBuf> {
        prepare_install(self.layout(), options, library_root, versions, links).await
    }

    /// Put the platform's original install back, if it was moved aside
    async fn restore_original(&self, library_root: &Path, links: &LinkManager) -> Result<RestoreOutcome> {
        let slot = self.layout().slot(library_root);
        links
            .remove_managed_links(slot.library_root(), slot.install_dir_name())
            .await?;
        slot.restore().await
    }
}

/// Shared native/managed preparation over an install layout
pub async fn prepare_install(
    layout: &InstallLayout,
    options: &LaunchOptions,
    library_root: &Path,
    versions: &dyn VersionRepository,
    links: &LinkManager,
) -> Result<PathBuf> {
    let slot = layout.slot(library_root);
    let version = &options.version;

    if version.native_to_platform {
        info!("Preparing native {} install at {}", options.platform, slot.canonical().display());
        return install::prepare_native(&slot, links).await;
    }

    let version_dir = versions
        .resolve_install_path(&version.id)
        .await
        .ok_or_else(|| Error::VersionNotFound {
            id: version.id.clone(),
        })?;

    info!(
        "Redirecting {} to version '{}' at {}",
        slot.canonical().display(),
        version.id,
        version_dir.display()
    );
    install::prepare_managed(&slot, links, &version_dir).await
}

/// One strategy value per distribution platform
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Steam
    Steam(SteamStrategy),
    /// Epic Games Store
    Epic(EpicStrategy),
}

impl Strategy {
    /// The platform this strategy serves
    pub fn platform(&self) -> Platform {
        match self {
            Strategy::Steam(_) => Platform::Steam,
            Strategy::Epic(_) => Platform::Epic,
        }
    }

    /// Borrow the strategy through its capability interface
    pub fn as_dyn(&self) -> &dyn LaunchStrategy {
        match self {
            Strategy::Steam(strategy) => strategy,
            Strategy::Epic(strategy) => strategy,
        }
    }
}

impl From<SteamStrategy> for Strategy {
    fn from(strategy: SteamStrategy) -> Self {
        Strategy::Steam(strategy)
    }
}

impl From<EpicStrategy> for Strategy {
    fn from(strategy: EpicStrategy) -> Self {
        Strategy::Epic(strategy)
    }
}

/// Append the caller's pass-through flags in their stable order
pub(crate) fn append_launch_flags(command: &mut Command, options: &LaunchOptions) {
    command.args(options.launch_flags.iter());
}
