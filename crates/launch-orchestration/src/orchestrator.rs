//! Launch orchestration engine
//!
//! [`LaunchOrchestrator::launch`] runs one request through the fixed
//! pipeline: exclusivity check, stale link cleanup, preparation of the
//! canonical install directory, executable check, spawn and wait. Progress
//! and the outcome are reported only through the returned
//! [`LaunchEventStream`].

use crate::discovery::{FsLibraryDiscovery, LibraryDiscovery};
use crate::error::{Error, LaunchFailure, Result};
use crate::event::{EventSender, LaunchEvent, LaunchEventStream};
use crate::install::RestoreOutcome;
use crate::link::LinkManager;
use crate::options::{LaunchOptions, Platform};
use crate::state::{LaunchState, StateTracker};
use crate::strategy::{LaunchStrategy, Strategy};
use crate::version::VersionRepository;
use async_runtime_compat::timeout;
use game_process::{ExitStatus, Launcher, LocalLauncher, ProcessHandle, ProcessInspector};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long library discovery may take before the launch fails
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables of the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Upper bound for locating a platform's library root
    pub discovery_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }
}

/// Prepares installs and launches games for the configured platforms
pub struct LaunchOrchestrator<L: Launcher = LocalLauncher> {
    strategies: Arc<Vec<Strategy>>,
    versions: Arc<dyn VersionRepository>,
    inspector: Arc<dyn ProcessInspector>,
    links: LinkManager,
    discovery: Arc<dyn LibraryDiscovery>,
    launcher: Arc<L>,
    settings: OrchestratorSettings,
}

impl<L: Launcher> Clone for LaunchOrchestrator<L> {
    fn clone(&self) -> Self {
        Self {
            strategies: self.strategies.clone(),
            versions: self.versions.clone(),
            inspector: self.inspector.clone(),
            links: self.links,
            discovery: self.discovery.clone(),
            launcher: self.launcher.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl LaunchOrchestrator<LocalLauncher> {
    /// Create an orchestrator that probes the local filesystem and spawns local processes
    pub fn new(
        strategies: Vec<Strategy>,
        versions: Arc<dyn VersionRepository>,
        inspector: Arc<dyn ProcessInspector>,
        links: LinkManager,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            strategies: Arc::new(strategies),
            versions,
            inspector,
            links,
            discovery: Arc::new(FsLibraryDiscovery::new()),
            launcher: Arc::new(LocalLauncher),
            settings,
        }
    }
}

impl<L: Launcher> LaunchOrchestrator<L> {
    /// Replace the library discovery
    pub fn with_discovery(mut self, discovery: Arc<dyn LibraryDiscovery>) -> Self {
        self.discovery = discovery;
        self
    }

    /// Replace the process launcher
    pub fn with_launcher<M: Launcher>(self, launcher: M) -> LaunchOrchestrator<M> {
        LaunchOrchestrator {
            strategies: self.strategies,
            versions: self.versions,
            inspector: self.inspector,
            links: self.links,
            discovery: self.discovery,
            launcher: Arc::new(launcher),
            settings: self.settings,
        }
    }

    /// The orchestrator's settings
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Platforms with a configured strategy
    pub fn platforms(&self) -> Vec<Platform> {
        self.strategies.iter().map(Strategy::platform).collect()
    }

    fn strategy(&self, platform: Platform) -> Option<&Strategy> {
        self.strategies.iter().find(|s| s.platform() == platform)
    }

    /// Start a launch
    ///
    /// The returned stream is lazy: the pipeline only runs while the stream
    /// is polled.
    pub fn launch(&self, options: LaunchOptions) -> LaunchEventStream {
        let this = self.clone();
        LaunchEventStream::new(move |events| this.run_pipeline(options, events))
    }

    async fn run_pipeline(self, options: LaunchOptions, events: EventSender) {
        let mut teardown = Teardown::new(events.clone(), options.platform);
        let mut state = StateTracker::new();

        info!(
            "Launching {} version '{}' ({})",
            options.platform,
            options.version.id,
            if options.version.native_to_platform { "native" } else { "managed" }
        );

        let terminal = match self.execute(&options, &events, &mut state).await {
            Ok(status) => {
                state.advance(LaunchState::Exited);
                info!("Game exited with {:?}", status);
                LaunchEvent::Exited { code: status.code }
            }
            Err(e) => {
                let failure = LaunchFailure::from(&e);
                state.advance(LaunchState::Failed(failure.kind));
                warn!("Launch failed: {}", failure);
                LaunchEvent::Failed(failure)
            }
        };

        events.emit(terminal);
        teardown.finish(state.current());
    }

    async fn execute(
        &self,
        options: &LaunchOptions,
        events: &EventSender,
        state: &mut StateTracker,
    ) -> Result<ExitStatus> {
        let strategy = self
            .strategy(options.platform)
            .ok_or(Error::PlatformNotConfigured(options.platform))?
            .as_dyn();
        let layout = strategy.layout();

        let executable_name = layout.executable_name();
        if self.inspector.is_running(&executable_name).await {
            return Err(Error::AlreadyRunning {
                executable: executable_name,
            });
        }
        state.advance(LaunchState::ExclusivityChecked);

        let library_root = self.discover(strategy).await;
        match &library_root {
            Ok(root) => match self
                .links
                .remove_managed_links(root, &layout.install_dir_name)
                .await
            {
                Ok(0) => debug!("No stale links under {}", root.display()),
                Ok(removed) => info!("Removed {} stale link(s) under {}", removed, root.display()),
                Err(e) => warn!("Stale link cleanup failed, continuing: {}", e),
            },
            Err(e) => warn!("Skipping stale link cleanup: {}", e),
        }
        state.advance(LaunchState::Cleaned);

        let library_root = library_root?;
        if !options.version.native_to_platform {
            events.emit(LaunchEvent::Downgrading);
        }
        let install_dir = strategy
            .prepare(options, &library_root, self.versions.as_ref(), &self.links)
            .await?;
        state.advance(LaunchState::Prepared);

        let executable = install_dir.join(&layout.executable);
        let exists = async_fs::metadata(&executable)
            .await
            .is_ok_and(|meta| meta.is_file());
        if !exists {
            return Err(Error::ExecutableNotFound { path: executable });
        }
        state.advance(LaunchState::Verified);

        events.emit(LaunchEvent::Launching);
        let command = strategy.launch_command(&executable, &install_dir, options);
        info!("Spawning {}", command.display());
        let mut handle = self.launcher.spawn(command).await?;
        state.advance(LaunchState::Launched);
        info!("Game running with pid {}", handle.pid());

        Ok(handle.wait().await?)
    }

    async fn discover(&self, strategy: &dyn LaunchStrategy) -> Result<PathBuf> {
        let platform = strategy.platform();
        let limit = self.settings.discovery_timeout;

        match timeout(limit, strategy.locate_library(self.discovery.as_ref())).await {
            Ok(Some(root)) => {
                info!("{} library root: {}", platform, root.display());
                Ok(root)
            }
            Ok(None) => Err(Error::library_not_found(platform, "no candidate library root exists")),
            Err(elapsed) => Err(Error::library_not_found(platform, elapsed.to_string())),
        }
    }

    /// Remove this tool's links from every configured platform library
    ///
    /// Platforms whose library cannot be found are skipped. Returns the
    /// number of links removed; running it again returns 0.
    pub async fn delete_managed_links(&self) -> Result<usize> {
        let mut removed = 0;
        for strategy in self.strategies.iter().map(Strategy::as_dyn) {
            let root = match self.discover(strategy).await {
                Ok(root) => root,
                Err(e) => {
                    debug!("Skipping {}: {}", strategy.platform(), e);
                    continue;
                }
            };
            removed += self
                .links
                .remove_managed_links(&root, &strategy.layout().install_dir_name)
                .await?;
        }
        info!("Removed {} managed link(s)", removed);
        Ok(removed)
    }

    /// Put every platform's original install back
    ///
    /// Refuses to touch the filesystem while the game is running. Every
    /// platform is attempted; the first failure is returned afterwards.
    pub async fn restore_original(&self) -> Result<Vec<(Platform, RestoreOutcome)>> {
        let mut outcomes = Vec::new();
        let mut first_error = None;

        for strategy in self.strategies.iter().map(Strategy::as_dyn) {
            let platform = strategy.platform();
            let executable_name = strategy.layout().executable_name();
            if self.inspector.is_running(&executable_name).await {
                if first_error.is_none() {
                    first_error = Some(Error::AlreadyRunning {
                        executable: executable_name,
                    });
                }
                continue;
            }

            let root = match self.discover(strategy).await {
                Ok(root) => root,
                Err(e) => {
                    debug!("Nothing to restore for {}: {}", platform, e);
                    continue;
                }
            };

            match strategy.restore_original(&root, &self.links).await {
                Ok(outcome) => {
                    info!("{}: {:?}", platform, outcome);
                    outcomes.push((platform, outcome));
                }
                Err(e) => {
                    warn!("Restoring {} failed: {}", platform, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outcomes),
        }
    }
}

/// Closes the event channel when the pipeline ends, however it ends
struct Teardown {
    events: EventSender,
    platform: Platform,
    started: Instant,
    outcome: Option<LaunchState>,
}

impl Teardown {
    fn new(events: EventSender, platform: Platform) -> Self {
        Self {
            events,
            platform,
            started: Instant::now(),
            outcome: None,
        }
    }

    fn finish(&mut self, state: LaunchState) {
        self.outcome = Some(state);
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.events.close();
        match self.outcome {
            Some(state) => info!(
                "{} launch finished in {:?}: {:?}",
                self.platform,
                self.started.elapsed(),
                state
            ),
            None => info!(
                "{} launch cancelled after {:?}",
                self.platform,
                self.started.elapsed()
            ),
        }
    }
}
