//! Steam launch strategy

use super::{InstallLayout, LaunchStrategy, append_launch_flags, prepare_install};
use crate::discovery::dedup_candidates;
use crate::error::Result;
use crate::link::LinkManager;
use crate::options::{LaunchOptions, Platform};
use crate::version::VersionRepository;
use async_trait::async_trait;
use game_process::Command;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// File Steamworks reads to learn the app id when started outside the client
pub const STEAM_APPID_FILE: &str = "steam_appid.txt";

static LIBRARY_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""path"\s+"((?:[^"\\]|\\.)*)""#).expect("valid regex"));

/// Steam strategy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteamConfig {
    /// Game layout inside `steamapps/common`
    pub layout: InstallLayout,
    /// Steam app id, used for the Steamworks environment
    pub app_id: Option<String>,
    /// Steam installation roots (each containing `steamapps`)
    pub steam_roots: Vec<PathBuf>,
}

impl SteamConfig {
    /// Create a config with no app id and no roots
    pub fn new(layout: InstallLayout) -> Self {
        Self {
            layout,
            app_id: None,
            steam_roots: Vec::new(),
        }
    }

    /// Set the Steam app id
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Add a Steam installation root
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.steam_roots.push(root.into());
        self
    }
}

/// Steam: libraries under `<root>/steamapps/common`, extra libraries from `libraryfolders.vdf`
#[derive(Debug, Clone)]
pub struct SteamStrategy {
    config: SteamConfig,
}

impl SteamStrategy {
    /// Create a Steam strategy
    pub fn new(config: SteamConfig) -> Self {
        Self { config }
    }

    /// The configuration this strategy was built from
    pub fn config(&self) -> &SteamConfig {
        &self.config
    }
}

/// Extract library folder paths from a `libraryfolders.vdf` document
pub fn parse_library_folders(vdf: &str) -> Vec<PathBuf> {
    LIBRARY_PATH
        .captures_iter(vdf)
        .map(|cap| PathBuf::from(cap[1].replace("\\\\", "\\")))
        .collect()
}

fn common_dir(root: &Path) -> PathBuf {
    root.join("steamapps").join("common")
}

#[async_trait]
impl LaunchStrategy for SteamStrategy {
    fn platform(&self) -> Platform {
        Platform::Steam
    }

    fn layout(&self) -> &InstallLayout {
        &self.config.layout
    }

    async fn library_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        for root in &self.config.steam_roots {
            candidates.push(common_dir(root));

            for vdf in [
                root.join("steamapps").join("libraryfolders.vdf"),
                root.join("config").join("libraryfolders.vdf"),
            ] {
                match async_fs::read_to_string(&vdf).await {
                    Ok(contents) => {
                        let folders = parse_library_folders(&contents);
                        debug!("{} lists {} libraries", vdf.display(), folders.len());
                        candidates.extend(folders.iter().map(|folder| common_dir(folder)));
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => warn!("Failed to read {}: {}", vdf.display(), e),
                }
            }
        }

        dedup_candidates(candidates)
    }

    async fn prepare(
        &self,
        options: &LaunchOptions,
        library_root: &Path,
        versions: &dyn VersionRepository,
        links: &LinkManager,
    ) -> Result<PathBuf> {
        let install_dir = prepare_install(self.layout(), options, library_root, versions, links).await?;

        // Managed copies are started outside the Steam client; Steamworks
        // needs the app id file to attach to it.
        if let (false, true, Some(app_id)) = (
            options.version.native_to_platform,
            options.platform_build,
            &self.config.app_id,
        ) {
            let appid_file = install_dir.join(STEAM_APPID_FILE);
            if async_fs::metadata(&appid_file).await.is_err() {
                async_fs::write(&appid_file, app_id.as_bytes()).await?;
                debug!("Wrote {}", appid_file.display());
            }
        }

        Ok(install_dir)
    }

    fn launch_command(&self, executable: &Path, install_dir: &Path, options: &LaunchOptions) -> Command {
        let mut command = Command::new(executable);
        command.current_dir(install_dir);

        if options.platform_build {
            if let Some(app_id) = &self.config.app_id {
                command.env("SteamAppId", app_id).env("SteamGameId", app_id);
            }
        }

        append_launch_flags(&mut command, options);
        command
    }
}
