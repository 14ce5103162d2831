//! Error types and the launch failure taxonomy.
//!
//! Internally every step returns [`Error`]. Before anything reaches the
//! caller it is classified into one of the fixed [`ErrorKind`]s and carried
//! on the event stream as a [`LaunchFailure`].

use crate::link::LinkError;
use crate::options::Platform;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fixed failure taxonomy surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The game executable is already running
    AlreadyRunning,
    /// The platform's library root could not be located in time
    PlatformLibraryNotFound,
    /// The executable (or the files that should contain it) is missing
    ExecutableNotFound,
    /// Redirecting the canonical install directory failed
    LinkCreationError,
    /// The operating system refused to start the game
    ProcessSpawnError,
    /// Anything not covered above
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::AlreadyRunning => "AlreadyRunning",
            ErrorKind::PlatformLibraryNotFound => "PlatformLibraryNotFound",
            ErrorKind::ExecutableNotFound => "ExecutableNotFound",
            ErrorKind::LinkCreationError => "LinkCreationError",
            ErrorKind::ProcessSpawnError => "ProcessSpawnError",
            ErrorKind::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Error types for launch orchestration
#[derive(Error, Debug)]
pub enum Error {
    /// The target executable is already running
    #[error("{executable} is already running")]
    AlreadyRunning {
        /// Executable name that was found in the process table
        executable: String,
    },

    /// Library root discovery failed or timed out
    #[error("{platform} library not found: {reason}")]
    LibraryNotFound {
        /// Platform whose library was searched
        platform: Platform,
        /// Why discovery gave up
        reason: String,
    },

    /// The resolved executable does not exist
    #[error("executable not found: {}", path.display())]
    ExecutableNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// The version repository has no install for this id
    #[error("version '{id}' is not installed")]
    VersionNotFound {
        /// Requested version identifier
        id: String,
    },

    /// Link manager failure
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Moving the canonical install aside failed
    #[error("failed to back up {}: {source}", path.display())]
    Backup {
        /// The canonical install directory
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Moving the backup back into place failed
    #[error("failed to restore {}: {source}", path.display())]
    Restore {
        /// The backup directory
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The canonical path holds a link or file that is not ours, so the backup cannot go back
    #[error("cannot restore over {}: it is not a managed link or an install directory", path.display())]
    RestoreConflict {
        /// The canonical install directory
        path: PathBuf,
    },

    /// Process control errors
    #[error("Process error: {0}")]
    Process(#[from] game_process::Error),

    /// No strategy is configured for the requested platform
    #[error("platform not configured: {0}")]
    PlatformNotConfigured(Platform),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a library not found error
    pub fn library_not_found(platform: Platform, reason: impl Into<String>) -> Self {
        Self::LibraryNotFound {
            platform,
            reason: reason.into(),
        }
    }

    /// Classify this error into the caller-facing taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AlreadyRunning { .. } => ErrorKind::AlreadyRunning,
            Error::LibraryNotFound { .. } => ErrorKind::PlatformLibraryNotFound,
            Error::ExecutableNotFound { .. } | Error::VersionNotFound { .. } => {
                ErrorKind::ExecutableNotFound
            }
            Error::Link(_) | Error::Backup { .. } => ErrorKind::LinkCreationError,
            Error::Process(game_process::Error::SpawnFailed { .. }) => {
                ErrorKind::ProcessSpawnError
            }
            Error::Restore { .. }
            | Error::RestoreConflict { .. }
            | Error::Process(_)
            | Error::PlatformNotConfigured(_)
            | Error::Io(_) => ErrorKind::Unknown,
        }
    }
}

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, Error>;

/// A classified failure, as carried by the terminal `Failed` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchFailure {
    /// Taxonomy kind
    pub kind: ErrorKind,
    /// Human readable message including the originating cause
    pub message: String,
}

impl LaunchFailure {
    /// Create a failure from its parts
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&Error> for LaunchFailure {
    fn from(error: &Error) -> Self {
        let mut message = error.to_string();
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        Self::new(error.kind(), message)
    }
}

impl fmt::Display for LaunchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
