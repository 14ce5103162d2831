//! Epic Games Store launch strategy

use super::{InstallLayout, LaunchStrategy, append_launch_flags};
use crate::discovery::dedup_candidates;
use crate::options::{LaunchOptions, Platform};
use async_trait::async_trait;
use futures::TryStreamExt;
use game_process::Command;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension of the launcher's install manifests
pub const MANIFEST_EXTENSION: &str = "item";

/// Epic strategy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpicConfig {
    /// Game layout inside the library root
    pub layout: InstallLayout,
    /// Catalog app name, matched against manifests and passed as `-epicapp`
    pub app_name: Option<String>,
    /// Directories holding the launcher's `*.item` manifests
    pub manifest_dirs: Vec<PathBuf>,
    /// Library roots probed when no manifest matches
    pub library_roots: Vec<PathBuf>,
}

impl EpicConfig {
    /// Create a config with no app name and no search locations
    pub fn new(layout: InstallLayout) -> Self {
        Self {
            layout,
            app_name: None,
            manifest_dirs: Vec::new(),
            library_roots: Vec::new(),
        }
    }

    /// Set the catalog app name
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// Add a manifest directory
    pub fn with_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifest_dirs.push(dir.into());
        self
    }

    /// Add a fallback library root
    pub fn with_library_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.library_roots.push(root.into());
        self
    }
}

/// The subset of an install manifest we read
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstallManifest {
    app_name: String,
    install_location: PathBuf,
}

/// Epic: libraries from launcher manifests, then configured roots
#[derive(Debug, Clone)]
pub struct EpicStrategy {
    config: EpicConfig,
}

impl EpicStrategy {
    /// Create an Epic strategy
    pub fn new(config: EpicConfig) -> Self {
        Self { config }
    }

    /// The configuration this strategy was built from
    pub fn config(&self) -> &EpicConfig {
        &self.config
    }

    async fn manifest_locations(&self, app_name: &str) -> Vec<PathBuf> {
        let mut found = Vec::new();

        for dir in &self.config.manifest_dirs {
            let mut entries = match async_fs::read_dir(dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("Skipping manifest dir {}: {}", dir.display(), e);
                    continue;
                }
            };

            loop {
                let entry = match entries.try_next().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to list {}: {}", dir.display(), e);
                        break;
                    }
                };

                let path = entry.path();
                if path.extension().is_none_or(|ext| ext != MANIFEST_EXTENSION) {
                    continue;
                }

                let manifest = match async_fs::read(&path).await {
                    Ok(bytes) => serde_json::from_slice::<InstallManifest>(&bytes),
                    Err(e) => {
                        warn!("Failed to read manifest {}: {}", path.display(), e);
                        continue;
                    }
                };

                match manifest {
                    Ok(manifest) if manifest.app_name.eq_ignore_ascii_case(app_name) => {
                        debug!(
                            "Manifest {} installs {} at {}",
                            path.display(),
                            app_name,
                            manifest.install_location.display()
                        );
                        if let Some(parent) = manifest.install_location.parent() {
                            found.push(parent.to_path_buf());
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Ignoring malformed manifest {}: {}", path.display(), e),
                }
            }
        }

        found
    }
}

#[async_trait]
impl LaunchStrategy for EpicStrategy {
    fn platform(&self) -> Platform {
        Platform::Epic
    }

    fn layout(&self) -> &InstallLayout {
        &self.config.layout
    }

    async fn library_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = match &self.config.app_name {
            Some(app_name) => self.manifest_locations(app_name).await,
            None => Vec::new(),
        };
        candidates.extend(self.config.library_roots.iter().cloned());
        dedup_candidates(candidates)
    }

    fn launch_command(&self, executable: &Path, install_dir: &Path, options: &LaunchOptions) -> Command {
        let mut command = Command::new(executable);
        command.current_dir(install_dir);

        if options.platform_build {
            command.arg("-EpicPortal");
            if let Some(app_name) = &self.config.app_name {
                command.arg(format!("-epicapp={}", app_name));
            }
            command.arg("-epicenv=Prod");
        }

        append_launch_flags(&mut command, options);
        command
    }
}
