//! Launcher trait for starting commands

use crate::command::Command;
use crate::error::Result;
use crate::process::{ExitStatus, ProcessHandle};
use async_trait::async_trait;

/// A launcher that can start commands on this machine
#[async_trait]
pub trait Launcher: Send + Sync + 'static {
    /// The process handle type this launcher produces
    type Handle: ProcessHandle;

    /// Spawn a command, returning a handle to await it
    async fn spawn(&self, command: Command) -> Result<Self::Handle>;

    /// Spawn a command and wait for it to complete
    async fn run(&self, command: Command) -> Result<ExitStatus> {
        let mut handle = self.spawn(command).await?;
        handle.wait().await
    }
}
