//! Process table inspection
//!
//! Store clients refuse a second game instance, and starting one while the
//! previous is still alive leaves the client in an undefined state. The
//! [`ProcessInspector`] gives the launch pipeline a way to ask first.

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::Path;
use sysinfo::{ProcessesToUpdate, System};
use tracing::debug;

/// Longest process name Linux reports (`comm` in `/proc/<pid>/stat`)
const COMM_LEN: usize = 15;

/// Answers whether an executable is currently running on this machine
#[async_trait]
pub trait ProcessInspector: Send + Sync {
    /// Returns true if any process with this executable name is alive
    async fn is_running(&self, executable_name: &str) -> bool;
}

/// [`ProcessInspector`] backed by a fresh `sysinfo` process snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessInspector;

impl SystemProcessInspector {
    /// Create an inspector
    pub fn new() -> Self {
        Self
    }

    fn scan(executable_name: &str) -> bool {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);

        system.processes().values().any(|process| {
            names_match(process.name(), executable_name)
                || process
                    .exe()
                    .and_then(Path::file_name)
                    .is_some_and(|name| names_match(name, executable_name))
        })
    }
}

#[async_trait]
impl ProcessInspector for SystemProcessInspector {
    async fn is_running(&self, executable_name: &str) -> bool {
        let wanted = executable_name.to_string();
        // The scan reads the whole process table synchronously.
        let running = blocking::unblock(move || Self::scan(&wanted)).await;

        debug!("Process '{}' running: {}", executable_name, running);
        running
    }
}

/// Compare a process name against an executable name
///
/// Matching ignores ASCII case and a trailing `.exe` on either side, since
/// the same game is reported as `Game.exe` on Windows and `Game` (or a
/// truncated `Game.exe`) under Wine. On Linux a 15-byte name also matches a
/// longer executable name it is the prefix of.
pub fn names_match(process_name: &OsStr, executable_name: &str) -> bool {
    let process_name = process_name.to_string_lossy();
    if strip_exe(&process_name).eq_ignore_ascii_case(strip_exe(executable_name)) {
        return true;
    }
    cfg!(target_os = "linux") && is_truncated_name(&process_name, executable_name)
}

fn is_truncated_name(process_name: &str, executable_name: &str) -> bool {
    process_name.len() == COMM_LEN
        && executable_name.len() > COMM_LEN
        && executable_name.as_bytes()[..COMM_LEN].eq_ignore_ascii_case(process_name.as_bytes())
}

fn strip_exe(name: &str) -> &str {
    let len = name.len();
    if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".exe") {
        &name[..len - 4]
    } else {
        name
    }
}
