//! Tests for the store-launch binary

use std::path::Path;
use std::process::Command;

fn store_launch(config: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_store-launch"));
    command.arg("--config").arg(config).env_remove("RUST_LOG");
    command
}

fn write_config(dir: &Path, steam_root: &Path) -> std::path::PathBuf {
    let config = format!(
        r#"
version: "1.0"
name: "cli-test"
versions_dir: '{}'
game:
  install_dir: "Game"
  executable: "store-launch-cli-game.sh"
platforms:
  steam:
    roots: ['{}']
"#,
        dir.join("versions").display(),
        steam_root.display()
    );
    let path = dir.join("launch.yaml");
    std::fs::write(&path, config).unwrap();
    path
}

#[test]
fn test_validate_lists_versions() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("versions").join("2021.6.30")).unwrap();
    let config = write_config(dir.path(), &dir.path().join("Steam"));

    let output = store_launch(&config).arg("validate").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Configuration valid"), "{}", stdout);
    assert!(stdout.contains("2021.6.30"), "{}", stdout);
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("launch.yaml");
    std::fs::write(&path, "version: \"0.1\"\nversions_dir: x\ngame: {install_dir: G, executable: g}\n").unwrap();

    let output = store_launch(&path).arg("validate").output().unwrap();
    assert!(!output.status.success());
}

#[cfg(unix)]
#[test]
fn test_launch_native_and_clean_links() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let steam = dir.path().join("Steam");
    let game = steam.join("steamapps").join("common").join("Game");
    std::fs::create_dir_all(&game).unwrap();
    let exe = game.join("store-launch-cli-game.sh");
    std::fs::write(&exe, "#!/bin/sh\ntouch launched\n").unwrap();
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
    let config = write_config(dir.path(), &steam);

    let output = store_launch(&config)
        .args(["launch", "--platform", "steam", "--game-version", "latest", "--native"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("exited with code 0"), "{}", stdout);
    assert!(game.join("launched").exists());

    let output = store_launch(&config).arg("clean-links").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Removed 0"));
}

#[test]
fn test_launch_unknown_version_fails() {
    let dir = tempfile::tempdir().unwrap();
    let steam = dir.path().join("Steam");
    std::fs::create_dir_all(steam.join("steamapps").join("common").join("Game")).unwrap();
    let config = write_config(dir.path(), &steam);

    let output = store_launch(&config)
        .args(["launch", "--platform", "steam", "--game-version", "2099.1.1"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ExecutableNotFound"), "{}", stderr);
}
