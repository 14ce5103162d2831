//! Local process launcher implementation

use async_process::Child;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::command::Command;
use crate::error::{Error, Result};
use crate::launcher::Launcher;
use crate::process::{ExitStatus, ProcessHandle};

/// Launcher for executing processes locally
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalLauncher;

/// A handle to a local process launched by us
///
/// Dropping the handle leaves the process running.
pub struct LocalProcessHandle {
    child: Child,
    pid: u32,
}

#[async_trait]
impl Launcher for LocalLauncher {
    type Handle = LocalProcessHandle;

    async fn spawn(&self, command: Command) -> Result<Self::Handle> {
        debug!("Spawning: {}", command.display());

        let child = command
            .prepare()
            .spawn()
            .map_err(|e| Error::spawn_failed(command.get_program().to_string_lossy(), e.to_string()))?;

        let pid = child.id();
        info!("Started {} with PID {}", command.get_program().to_string_lossy(), pid);

        Ok(LocalProcessHandle { child, pid })
    }
}

#[async_trait]
impl ProcessHandle for LocalProcessHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    async fn wait(&mut self) -> Result<ExitStatus> {
        let status = self.child.status().await.map_err(|e| Error::WaitFailed {
            pid: self.pid,
            reason: e.to_string(),
        })?;

        let status = ExitStatus::from(status);
        debug!("Process {} exited: {:?}", self.pid, status);
        Ok(status)
    }
}
