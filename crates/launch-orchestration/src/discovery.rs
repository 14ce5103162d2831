//! Platform library discovery
//!
//! Strategies produce candidate library roots (configured search paths plus
//! whatever the store client's own metadata points at). A
//! [`LibraryDiscovery`] then probes them and picks one. Probing may be slow
//! (network drives, sleeping disks) so the orchestrator always bounds it
//! with a timeout.

use async_trait::async_trait;
use futures::future::{self, FutureExt};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locates the library root of a platform among candidate directories
#[async_trait]
pub trait LibraryDiscovery: Send + Sync {
    /// Return the first candidate that is a usable library root
    ///
    /// `wanted` lists entry names (the canonical install directory and its
    /// backup) whose presence marks the library that actually holds the game.
    async fn find_library_root(&self, candidates: &[PathBuf], wanted: &[String]) -> Option<PathBuf>;
}

/// [`LibraryDiscovery`] that probes the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLibraryDiscovery;

impl FsLibraryDiscovery {
    /// Create a new filesystem discovery
    pub fn new() -> Self {
        Self
    }
}

async fn is_dir(path: &Path) -> bool {
    async_fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

async fn holds_any(root: &Path, wanted: &[String]) -> bool {
    for name in wanted {
        if async_fs::symlink_metadata(root.join(name)).await.is_ok() {
            return true;
        }
    }
    false
}

#[async_trait]
impl LibraryDiscovery for FsLibraryDiscovery {
    async fn find_library_root(&self, candidates: &[PathBuf], wanted: &[String]) -> Option<PathBuf> {
        if candidates.is_empty() {
            return None;
        }

        // Probe every candidate at once; the first library holding the game wins.
        let probes = candidates.iter().cloned().map(|root| {
            async move {
                if is_dir(&root).await && holds_any(&root, wanted).await {
                    Ok(root)
                } else {
                    Err(())
                }
            }
            .boxed()
        });

        if let Ok((root, _pending)) = future::select_ok(probes).await {
            debug!("Library root holding the game: {}", root.display());
            return Some(root);
        }

        // Nothing installed anywhere yet: fall back to the first existing library.
        for root in candidates {
            if is_dir(root).await {
                debug!("Falling back to library root {}", root.display());
                return Some(root.clone());
            }
        }

        None
    }
}

/// Remove duplicate candidates while keeping their order
pub fn dedup_candidates(candidates: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut unique: Vec<PathBuf> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }
    unique
}
