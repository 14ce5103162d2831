//! Runtime-agnostic async utilities
//!
//! This crate provides the timer primitives the launch pipeline needs
//! without coupling callers to a specific executor. Exactly one runtime
//! feature (`smol` or `tokio`) selects the timer backend; `smol` wins when
//! both are enabled.
//!
//! # Examples
//!
//! ```no_run
//! use async_runtime_compat::prelude::*;
//! use std::time::Duration;
//!
//! # #[cfg(feature = "smol")]
//! smol::block_on(async {
//!     let slow = async {
//!         sleep(Duration::from_secs(60)).await;
//!         42
//!     };
//!     assert!(timeout(Duration::from_millis(10), slow).await.is_err());
//! });
//! ```

#![warn(missing_docs)]

pub mod runtime_utils;

pub use runtime_utils::{Elapsed, sleep, timeout};

/// Prelude for common imports
pub mod prelude {
    pub use crate::runtime_utils::{Elapsed, sleep, timeout};
}
