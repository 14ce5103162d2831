//! Integration tests for the local launcher

use game_process::{Command, Launcher, LocalLauncher, ProcessHandle};
use std::time::Duration;

#[cfg(unix)]
#[smol_potat::test]
async fn test_local_launcher_reports_exit_code() {
    let mut command = Command::new("sh");
    command.arg("-c").arg("exit 3");

    let status = LocalLauncher.run(command).await.unwrap();
    assert_eq!(status.code, Some(3));
    assert!(!status.success());
}

#[cfg(unix)]
#[smol_potat::test]
async fn test_local_launcher_uses_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut command = Command::new("sh");
    command.arg("-c").arg("touch launched").current_dir(dir.path());

    let status = LocalLauncher.run(command).await.unwrap();
    assert!(status.success());
    assert!(dir.path().join("launched").exists());
}

#[smol_potat::test]
async fn test_local_launcher_spawn_failure() {
    let command = Command::new("this_game_does_not_exist_12345");

    let err = LocalLauncher.spawn(command).await.err().unwrap();
    let message = err.to_string();
    assert!(message.contains("failed to spawn"), "{}", message);
    assert!(message.contains("this_game_does_not_exist_12345"), "{}", message);
}

#[cfg(unix)]
#[smol_potat::test]
async fn test_signal_exit_is_reported() {
    let mut command = Command::new("sh");
    command.arg("-c").arg("kill -TERM $$");

    let mut handle = LocalLauncher.spawn(command).await.unwrap();
    assert!(handle.pid() > 0);

    let status = handle.wait().await.unwrap();
    assert_eq!(status.code, None);
    assert_eq!(status.signal, Some(15));
    assert!(status.terminated_by_signal());
}

#[cfg(unix)]
#[smol_potat::test]
async fn test_dropping_handle_leaves_process_running() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("still-alive");

    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg(format!("sleep 0.3; touch '{}'", marker.display()));

    let handle = LocalLauncher.spawn(command).await.unwrap();
    drop(handle);

    smol::Timer::after(Duration::from_millis(1500)).await;
    assert!(marker.exists(), "process should outlive its handle");
}
