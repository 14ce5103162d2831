//! End-to-end tests of the launch pipeline against a fake Steam library
//!
//! The "game" is a shell script, so these tests only run on Unix.

#![cfg(unix)]

use async_trait::async_trait;
use futures::StreamExt;
use game_process::ProcessInspector;
use launch_orchestration::{
    DirectoryVersionRepository, EpicConfig, EpicStrategy, ErrorKind, InstallLayout, LaunchEvent, LaunchOptions,
    LaunchOrchestrator, LibraryDiscovery, LinkManager, MARKER_FILE, OrchestratorSettings, Platform,
    RestoreOutcome, SteamConfig, SteamStrategy, VersionDescriptor,
};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const GAME_DIR: &str = "Game";
const GAME_EXE: &str = "game.sh";

/// Inspector with a fixed answer
struct FakeInspector(bool);

#[async_trait]
impl ProcessInspector for FakeInspector {
    async fn is_running(&self, _executable_name: &str) -> bool {
        self.0
    }
}

/// Discovery that never finishes
struct StuckDiscovery;

#[async_trait]
impl LibraryDiscovery for StuckDiscovery {
    async fn find_library_root(&self, _candidates: &[PathBuf], _wanted: &[String]) -> Option<PathBuf> {
        futures::future::pending().await
    }
}

struct Fixture {
    _dir: TempDir,
    steam: PathBuf,
    epic: PathBuf,
    versions: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let steam = dir.path().join("Steam");
        let epic = dir.path().join("Epic Games");
        let versions = dir.path().join("versions");
        std::fs::create_dir_all(steam.join("steamapps").join("common")).unwrap();
        std::fs::create_dir_all(&epic).unwrap();
        std::fs::create_dir_all(&versions).unwrap();
        Self {
            _dir: dir,
            steam,
            epic,
            versions,
        }
    }

    fn library(&self) -> PathBuf {
        self.steam.join("steamapps").join("common")
    }

    fn canonical(&self) -> PathBuf {
        self.library().join(GAME_DIR)
    }

    fn backup(&self) -> PathBuf {
        self.library().join(format!("{}.original", GAME_DIR))
    }

    /// Install the store client's own build at the canonical location
    fn install_native(&self, body: &str) {
        write_game(&self.canonical(), body);
    }

    /// Install a managed version
    fn install_version(&self, id: &str, body: &str) -> PathBuf {
        let dir = self.versions.join(id);
        write_game(&dir, body);
        dir
    }

    fn steam_strategy(&self) -> SteamStrategy {
        SteamStrategy::new(
            SteamConfig::new(InstallLayout::new(GAME_DIR, GAME_EXE)).with_root(&self.steam),
        )
    }

    fn orchestrator(&self, running: bool) -> LaunchOrchestrator {
        LaunchOrchestrator::new(
            vec![self.steam_strategy().into()],
            Arc::new(DirectoryVersionRepository::new(&self.versions)),
            Arc::new(FakeInspector(running)),
            LinkManager::new(),
            OrchestratorSettings::default(),
        )
    }

    /// Steam and Epic sharing one versions directory
    fn orchestrator_with_epic(&self) -> LaunchOrchestrator {
        let epic = EpicStrategy::new(
            EpicConfig::new(InstallLayout::new(GAME_DIR, GAME_EXE)).with_library_root(&self.epic),
        );
        LaunchOrchestrator::new(
            vec![self.steam_strategy().into(), epic.into()],
            Arc::new(DirectoryVersionRepository::new(&self.versions)),
            Arc::new(FakeInspector(false)),
            LinkManager::new(),
            OrchestratorSettings::default(),
        )
    }
}

fn write_game(dir: &Path, body: &str) {
    std::fs::create_dir_all(dir).unwrap();
    let exe = dir.join(GAME_EXE);
    std::fs::write(&exe, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
}

fn failure_kind(events: &[LaunchEvent]) -> Option<ErrorKind> {
    match events.last() {
        Some(LaunchEvent::Failed(failure)) => Some(failure.kind),
        _ => None,
    }
}

fn managed(id: &str) -> LaunchOptions {
    LaunchOptions::new(Platform::Steam, VersionDescriptor::managed(id))
}

fn native() -> LaunchOptions {
    LaunchOptions::new(Platform::Steam, VersionDescriptor::native("latest"))
}

#[smol_potat::test]
async fn test_native_launch_reports_exit_code() {
    let fixture = Fixture::new();
    fixture.install_native("exit 7");

    let events: Vec<_> = fixture.orchestrator(false).launch(native()).collect().await;

    assert_eq!(events, vec![LaunchEvent::Launching, LaunchEvent::Exited { code: Some(7) }]);
    let canonical = fixture.canonical();
    assert!(!std::fs::symlink_metadata(&canonical).unwrap().file_type().is_symlink());
    assert!(!canonical.join(MARKER_FILE).exists());
}

#[smol_potat::test]
async fn test_managed_launch_links_version_and_keeps_backup() {
    let fixture = Fixture::new();
    fixture.install_native("echo native > ran");
    let version = fixture.install_version("2021.6.30", "echo managed > ran");

    let events: Vec<_> = fixture
        .orchestrator(false)
        .launch(managed("2021.6.30"))
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            LaunchEvent::Downgrading,
            LaunchEvent::Launching,
            LaunchEvent::Exited { code: Some(0) },
        ]
    );
    assert_eq!(std::fs::read_link(fixture.canonical()).unwrap(), version);
    assert!(LinkManager::new().is_managed_link(&fixture.canonical()).await);
    assert!(fixture.backup().join(GAME_EXE).is_file());
    assert_eq!(std::fs::read_to_string(version.join("ran")).unwrap(), "managed\n");
}

#[smol_potat::test]
async fn test_native_after_managed_restores_original() {
    let fixture = Fixture::new();
    fixture.install_native("exit 0");
    fixture.install_version("v1", "exit 0");
    let orchestrator = fixture.orchestrator(false);

    let _: Vec<_> = orchestrator.launch(managed("v1")).collect().await;
    let events: Vec<_> = orchestrator.launch(native()).collect().await;

    assert_eq!(events.last(), Some(&LaunchEvent::Exited { code: Some(0) }));
    let meta = std::fs::symlink_metadata(fixture.canonical()).unwrap();
    assert!(meta.is_dir());
    assert!(!fixture.canonical().join(MARKER_FILE).exists());
    assert!(!fixture.backup().exists());
}

#[smol_potat::test]
async fn test_relaunching_managed_version_is_idempotent() {
    let fixture = Fixture::new();
    fixture.install_native("exit 0");
    let version = fixture.install_version("v1", "exit 0");
    let orchestrator = fixture.orchestrator(false);

    for _ in 0..2 {
        let events: Vec<_> = orchestrator.launch(managed("v1")).collect().await;
        assert_eq!(events.last(), Some(&LaunchEvent::Exited { code: Some(0) }));
    }
    assert_eq!(std::fs::read_link(fixture.canonical()).unwrap(), version);
    assert!(fixture.backup().join(GAME_EXE).is_file());
}

#[smol_potat::test]
async fn test_existing_backup_is_never_overwritten() {
    let fixture = Fixture::new();
    write_game(&fixture.backup(), "echo original");
    fixture.install_native("echo reinstalled");
    fixture.install_version("v1", "exit 0");

    let events: Vec<_> = fixture.orchestrator(false).launch(managed("v1")).collect().await;

    assert_eq!(failure_kind(&events), Some(ErrorKind::LinkCreationError));
    let backup = std::fs::read_to_string(fixture.backup().join(GAME_EXE)).unwrap();
    assert!(backup.contains("echo original"));
    let canonical = std::fs::read_to_string(fixture.canonical().join(GAME_EXE)).unwrap();
    assert!(canonical.contains("echo reinstalled"));
}

#[smol_potat::test]
async fn test_already_running_changes_nothing() {
    let fixture = Fixture::new();
    fixture.install_native("exit 0");
    fixture.install_version("v1", "exit 0");

    let events: Vec<_> = fixture.orchestrator(true).launch(managed("v1")).collect().await;

    assert_eq!(events.len(), 1);
    assert_eq!(failure_kind(&events), Some(ErrorKind::AlreadyRunning));
    assert!(!std::fs::symlink_metadata(fixture.canonical()).unwrap().file_type().is_symlink());
    assert!(!fixture.backup().exists());
}

#[smol_potat::test]
async fn test_discovery_timeout_is_bounded() {
    let fixture = Fixture::new();
    fixture.install_native("exit 0");
    let orchestrator = LaunchOrchestrator::new(
        vec![SteamStrategy::new(SteamConfig::new(InstallLayout::new(GAME_DIR, GAME_EXE))).into()],
        Arc::new(DirectoryVersionRepository::new(&fixture.versions)),
        Arc::new(FakeInspector(false)),
        LinkManager::new(),
        OrchestratorSettings {
            discovery_timeout: Duration::from_millis(100),
        },
    )
    .with_discovery(Arc::new(StuckDiscovery));

    let start = Instant::now();
    let events: Vec<_> = orchestrator.launch(managed("v1")).collect().await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(events.len(), 1);
    assert_eq!(failure_kind(&events), Some(ErrorKind::PlatformLibraryNotFound));
}

#[smol_potat::test]
async fn test_missing_library_root() {
    let fixture = Fixture::new();
    std::fs::remove_dir_all(fixture.library()).unwrap();

    let events: Vec<_> = fixture.orchestrator(false).launch(native()).collect().await;
    assert_eq!(failure_kind(&events), Some(ErrorKind::PlatformLibraryNotFound));
}

#[smol_potat::test]
async fn test_missing_executable_names_the_path() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(fixture.canonical()).unwrap();

    let events: Vec<_> = fixture.orchestrator(false).launch(native()).collect().await;

    match events.as_slice() {
        [LaunchEvent::Failed(failure)] => {
            assert_eq!(failure.kind, ErrorKind::ExecutableNotFound);
            assert!(failure.message.contains(GAME_EXE), "{}", failure.message);
        }
        other => panic!("unexpected events: {:?}", other),
    }
}

#[smol_potat::test]
async fn test_unknown_version_is_executable_not_found() {
    let fixture = Fixture::new();
    fixture.install_native("exit 0");

    let events: Vec<_> = fixture.orchestrator(false).launch(managed("2099.1.1")).collect().await;

    assert_eq!(events.first(), Some(&LaunchEvent::Downgrading));
    assert_eq!(failure_kind(&events), Some(ErrorKind::ExecutableNotFound));
    // The native install is still where the client expects it.
    assert!(fixture.canonical().join(GAME_EXE).is_file());
}

#[smol_potat::test]
async fn test_unspawnable_executable_is_spawn_error() {
    let fixture = Fixture::new();
    fixture.install_native("exit 0");
    let exe = fixture.canonical().join(GAME_EXE);
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o644)).unwrap();

    let events: Vec<_> = fixture.orchestrator(false).launch(native()).collect().await;

    assert_eq!(events.first(), Some(&LaunchEvent::Launching));
    assert_eq!(failure_kind(&events), Some(ErrorKind::ProcessSpawnError));
}

#[smol_potat::test]
async fn test_unconfigured_platform_is_unknown() {
    let fixture = Fixture::new();
    let options = LaunchOptions::new(Platform::Epic, VersionDescriptor::native("latest"));

    let events: Vec<_> = fixture.orchestrator(false).launch(options).collect().await;
    assert_eq!(failure_kind(&events), Some(ErrorKind::Unknown));
}

#[smol_potat::test]
async fn test_cancel_leaves_game_running() {
    let fixture = Fixture::new();
    fixture.install_native("sleep 1\necho done > finished");

    let mut events = fixture.orchestrator(false).launch(native());
    assert_eq!(events.next().await, Some(LaunchEvent::Launching));

    // The game is alive and being waited on.
    let pending = async_runtime_compat::timeout(Duration::from_millis(100), events.next()).await;
    assert!(pending.is_err());

    events.cancel();
    assert_eq!(events.next().await, None);
    drop(events);

    let finished = fixture.canonical().join("finished");
    let deadline = Instant::now() + Duration::from_secs(10);
    while !finished.exists() && Instant::now() < deadline {
        async_runtime_compat::sleep(Duration::from_millis(50)).await;
    }
    assert!(finished.exists(), "game should outlive the cancelled stream");
}

#[smol_potat::test]
async fn test_delete_managed_links_twice() {
    let fixture = Fixture::new();
    fixture.install_native("exit 0");
    fixture.install_version("v1", "exit 0");
    let orchestrator = fixture.orchestrator(false);
    let _: Vec<_> = orchestrator.launch(managed("v1")).collect().await;

    assert_eq!(orchestrator.delete_managed_links().await.unwrap(), 1);
    assert_eq!(orchestrator.delete_managed_links().await.unwrap(), 0);
    assert!(std::fs::symlink_metadata(fixture.canonical()).is_err());
    // Targets are never removed.
    assert!(fixture.versions.join("v1").join(GAME_EXE).is_file());
}

#[smol_potat::test]
async fn test_restore_original_after_managed_launch() {
    let fixture = Fixture::new();
    fixture.install_native("echo native");
    fixture.install_version("v1", "exit 0");
    let orchestrator = fixture.orchestrator(false);
    let _: Vec<_> = orchestrator.launch(managed("v1")).collect().await;

    let outcomes = orchestrator.restore_original().await.unwrap();
    assert_eq!(outcomes, vec![(Platform::Steam, RestoreOutcome::Restored)]);
    let restored = std::fs::read_to_string(fixture.canonical().join(GAME_EXE)).unwrap();
    assert!(restored.contains("echo native"));

    let again = orchestrator.restore_original().await.unwrap();
    assert_eq!(again, vec![(Platform::Steam, RestoreOutcome::NothingToRestore)]);
}

#[smol_potat::test]
async fn test_restore_refused_while_running() {
    let fixture = Fixture::new();
    write_game(&fixture.backup(), "exit 0");

    let err = fixture.orchestrator(true).restore_original().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyRunning);
    assert!(fixture.backup().exists());
}

#[smol_potat::test]
async fn test_native_launch_after_version_dir_was_deleted() {
    let fixture = Fixture::new();
    fixture.install_native("echo native > ran");
    let version = fixture.install_version("v1", "exit 0");
    let orchestrator = fixture.orchestrator(false);
    let _: Vec<_> = orchestrator.launch(managed("v1")).collect().await;

    // The canonical link now dangles.
    std::fs::remove_dir_all(&version).unwrap();

    let events: Vec<_> = orchestrator.launch(native()).collect().await;

    assert_eq!(events.last(), Some(&LaunchEvent::Exited { code: Some(0) }));
    assert!(!fixture.backup().exists());
    let meta = std::fs::symlink_metadata(fixture.canonical()).unwrap();
    assert!(meta.is_dir());
    assert_eq!(std::fs::read_to_string(fixture.canonical().join("ran")).unwrap(), "native\n");
}

#[smol_potat::test]
async fn test_managed_launch_after_version_dir_was_deleted() {
    let fixture = Fixture::new();
    fixture.install_native("exit 0");
    let old = fixture.install_version("v1", "exit 0");
    let new = fixture.install_version("v2", "exit 0");
    let orchestrator = fixture.orchestrator(false);
    let _: Vec<_> = orchestrator.launch(managed("v1")).collect().await;
    std::fs::remove_dir_all(&old).unwrap();

    let events: Vec<_> = orchestrator.launch(managed("v2")).collect().await;

    assert_eq!(events.last(), Some(&LaunchEvent::Exited { code: Some(0) }));
    assert_eq!(std::fs::read_link(fixture.canonical()).unwrap(), new);
    assert!(fixture.backup().join(GAME_EXE).is_file());
}

#[smol_potat::test]
async fn test_managed_launch_resumes_after_interrupted_backup() {
    let fixture = Fixture::new();
    // Backed up, but the link was never created.
    write_game(&fixture.backup(), "echo original");
    let version = fixture.install_version("v1", "exit 0");

    let events: Vec<_> = fixture.orchestrator(false).launch(managed("v1")).collect().await;

    assert_eq!(events.last(), Some(&LaunchEvent::Exited { code: Some(0) }));
    assert_eq!(std::fs::read_link(fixture.canonical()).unwrap(), version);
    let backup = std::fs::read_to_string(fixture.backup().join(GAME_EXE)).unwrap();
    assert!(backup.contains("echo original"));
}

#[smol_potat::test]
async fn test_platforms_sharing_a_version_keep_their_own_links() {
    let fixture = Fixture::new();
    fixture.install_native("echo steam");
    write_game(&fixture.epic.join(GAME_DIR), "echo epic");
    let version = fixture.install_version("v1", "exit 0");
    let orchestrator = fixture.orchestrator_with_epic();

    let epic_managed = LaunchOptions::new(Platform::Epic, VersionDescriptor::managed("v1"));
    let _: Vec<_> = orchestrator.launch(managed("v1")).collect().await;
    let _: Vec<_> = orchestrator.launch(epic_managed).collect().await;

    // Going native on Steam must leave the Epic link recognisable.
    let events: Vec<_> = orchestrator.launch(native()).collect().await;
    assert_eq!(events.last(), Some(&LaunchEvent::Exited { code: Some(0) }));
    let epic_link = fixture.epic.join(GAME_DIR);
    assert!(LinkManager::new().is_managed_link(&epic_link).await);
    assert_eq!(std::fs::read_link(&epic_link).unwrap(), version);

    let epic_native = LaunchOptions::new(Platform::Epic, VersionDescriptor::native("latest"));
    let events: Vec<_> = orchestrator.launch(epic_native).collect().await;
    assert_eq!(events.last(), Some(&LaunchEvent::Exited { code: Some(0) }));
    let restored = std::fs::read_to_string(epic_link.join(GAME_EXE)).unwrap();
    assert!(restored.contains("echo epic"));
    assert!(!fixture.epic.join(format!("{}.original", GAME_DIR)).exists());
}
