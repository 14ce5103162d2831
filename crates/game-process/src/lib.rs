//! Runtime-agnostic game process control
//!
//! This crate provides the process-level collaborators of the launch
//! pipeline: a reusable [`Command`] builder, a [`Launcher`] that spawns it,
//! a [`ProcessHandle`] to await the exit, and a [`ProcessInspector`] that
//! answers whether an executable is already running on this machine.

#![warn(missing_docs)]

pub mod backends;
pub mod command;
pub mod error;
pub mod inspector;
pub mod launcher;
pub mod process;

pub use backends::{LocalLauncher, LocalProcessHandle};
pub use command::Command;
pub use error::{Error, Result};
pub use inspector::{ProcessInspector, SystemProcessInspector};
pub use launcher::Launcher;
pub use process::{ExitStatus, ProcessHandle};
