//! Store-aware game launch orchestration
//!
//! This crate prepares a playable install of a requested game version for a
//! distribution platform and launches it. Store clients expect the game at a
//! fixed canonical directory; for versions the store does not ship, that
//! directory is redirected through a managed link to an out-of-band version
//! directory while the client's own install is parked in a backup.
//!
//! # Architecture
//!
//! - [`LaunchStrategy`] / [`Strategy`]: per-platform library discovery,
//!   install preparation and launch arguments
//! - [`LinkManager`]: marker-guarded directory links
//! - [`VersionRepository`]: version id to install directory
//! - [`LaunchOrchestrator`]: runs a request and reports through a
//!   [`LaunchEventStream`]
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use game_process::SystemProcessInspector;
//! use launch_orchestration::*;
//! use std::sync::Arc;
//!
//! # smol::block_on(async {
//! let steam = SteamStrategy::new(
//!     SteamConfig::new(InstallLayout::new("Among Us", "Among Us.exe"))
//!         .with_root("/home/me/.steam/steam"),
//! );
//! let orchestrator = LaunchOrchestrator::new(
//!     vec![steam.into()],
//!     Arc::new(DirectoryVersionRepository::new("/home/me/versions")),
//!     Arc::new(SystemProcessInspector::new()),
//!     LinkManager::new(),
//!     OrchestratorSettings::default(),
//! );
//!
//! let options = LaunchOptions::new(Platform::Steam, VersionDescriptor::managed("2021.6.30"));
//! let mut events = orchestrator.launch(options);
//! while let Some(event) = events.next().await {
//!     println!("{:?}", event);
//! }
//! # });
//! ```

#![warn(missing_docs)]

pub mod discovery;
pub mod error;
pub mod event;
pub mod install;
pub mod link;
pub mod options;
pub mod orchestrator;
pub mod state;
pub mod strategy;
pub mod version;

pub use discovery::{FsLibraryDiscovery, LibraryDiscovery};
pub use error::{Error, ErrorKind, LaunchFailure, Result};
pub use event::{LaunchEvent, LaunchEventStream};
pub use install::{BACKUP_SUFFIX, InstallSlot, RestoreOutcome};
pub use link::{LinkError, LinkManager, LinkMarker, MARKER_FILE};
pub use options::{LaunchOptions, Platform, VersionDescriptor};
pub use orchestrator::{DEFAULT_DISCOVERY_TIMEOUT, LaunchOrchestrator, OrchestratorSettings};
pub use state::{LaunchState, StateTracker};
pub use strategy::{
    EpicConfig, EpicStrategy, InstallLayout, LaunchStrategy, SteamConfig, SteamStrategy, Strategy,
};
pub use version::{DirectoryVersionRepository, VersionRepository};
