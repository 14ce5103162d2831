//! Managed directory links.
//!
//! A managed link is a directory link (a symlink on Unix, a junction on
//! Windows) whose target carries a [`MARKER_FILE`]. The marker is what makes
//! the link ours: links without it were created by the user or the store
//! client and are never touched.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Ownership marker written inside every managed link
pub const MARKER_FILE: &str = "metadata.config";

/// Value of [`LinkMarker::managed_by`]
pub const MARKER_OWNER: &str = "store-launch";

/// Link manager errors
#[derive(Error, Debug)]
pub enum LinkError {
    /// Something already exists where the link should go
    #[error("cannot create link at {}: path already exists", path.display())]
    Conflict {
        /// The requested link path
        path: PathBuf,
    },

    /// The link target is not an existing directory
    #[error("link target {} is not a directory", path.display())]
    TargetMissing {
        /// The requested target
        path: PathBuf,
    },

    /// The OS refused to create the link
    #[error("failed to link {} -> {}: {reason}", link.display(), target.display())]
    CreateFailed {
        /// The requested link path
        link: PathBuf,
        /// The requested target
        target: PathBuf,
        /// Why creation failed
        reason: String,
    },

    /// Writing the ownership marker failed
    #[error("failed to write ownership marker in {}: {source}", path.display())]
    Marker {
        /// The marker path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Listing the base directory failed
    #[error("failed to scan {}: {source}", path.display())]
    Scan {
        /// The scanned directory
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Removing a managed link failed
    #[error("failed to remove link {}: {source}", path.display())]
    RemoveFailed {
        /// The link path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
}

/// Contents of the ownership marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMarker {
    /// Always [`MARKER_OWNER`]
    pub managed_by: String,
    /// The directory the link was created for
    pub target: PathBuf,
    /// When the link was created
    pub created_at: DateTime<Utc>,
}

/// Creates, detects and removes managed directory links
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkManager;

impl LinkManager {
    /// Create a new link manager
    pub fn new() -> Self {
        Self
    }

    /// Create a directory link at `link_path` pointing to `target` and mark it as ours
    ///
    /// Fails with [`LinkError::Conflict`] if any entry (file, directory or
    /// link, even a dangling one) already occupies `link_path`.
    pub async fn create_managed_link(&self, target: &Path, link_path: &Path) -> Result<(), LinkError> {
        if async_fs::symlink_metadata(link_path).await.is_ok() {
            return Err(LinkError::Conflict {
                path: link_path.to_path_buf(),
            });
        }

        match async_fs::metadata(target).await {
            Ok(meta) if meta.is_dir() => {}
            _ => {
                return Err(LinkError::TargetMissing {
                    path: target.to_path_buf(),
                });
            }
        }

        create_dir_link(target, link_path).await?;
        debug!("Linked {} -> {}", link_path.display(), target.display());

        let marker = LinkMarker {
            managed_by: MARKER_OWNER.to_string(),
            target: target.to_path_buf(),
            created_at: Utc::now(),
        };
        let marker_path = link_path.join(MARKER_FILE);
        let contents = serde_json::to_vec_pretty(&marker)
            .map_err(|e| LinkError::Marker {
                path: marker_path.clone(),
                source: io::Error::other(e),
            })?;

        if let Err(source) = async_fs::write(&marker_path, contents).await {
            // A link without its marker would be orphaned forever.
            let _ = remove_dir_link(link_path).await;
            return Err(LinkError::Marker {
                path: marker_path,
                source,
            });
        }

        info!("Created managed link {} -> {}", link_path.display(), target.display());
        Ok(())
    }

    /// Remove every managed link directly under `base` whose name starts with `prefix`
    ///
    /// Entries that are not directory links, or that lack the marker, are
    /// left alone. A missing `base` is treated as empty. Returns the number
    /// of links removed.
    pub async fn remove_managed_links(&self, base: &Path, prefix: &str) -> Result<usize, LinkError> {
        let mut entries = match async_fs::read_dir(base).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist, nothing to clean", base.display());
                return Ok(0);
            }
            Err(source) => {
                return Err(LinkError::Scan {
                    path: base.to_path_buf(),
                    source,
                });
            }
        };

        let mut candidates = Vec::new();
        while let Some(entry) = entries.try_next().await.map_err(|source| LinkError::Scan {
            path: base.to_path_buf(),
            source,
        })? {
            if entry.file_name().to_string_lossy().starts_with(prefix) {
                candidates.push(entry.path());
            }
        }

        let mut removed = 0;
        for path in candidates {
            if !self.is_managed_link(&path).await {
                continue;
            }

            // The marker stays in the target: other links may share it.
            remove_dir_link(&path)
                .await
                .map_err(|source| LinkError::RemoveFailed {
                    path: path.clone(),
                    source,
                })?;

            info!("Removed managed link {}", path.display());
            removed += 1;
        }

        Ok(removed)
    }

    /// Whether `path` is a directory link carrying our marker
    pub async fn is_managed_link(&self, path: &Path) -> bool {
        self.read_marker(path).await.is_some()
    }

    /// Read the marker of the managed link at `path`
    ///
    /// Returns `None` for anything that is not a live directory link with a
    /// well-formed marker.
    pub async fn read_marker(&self, path: &Path) -> Option<LinkMarker> {
        let meta = async_fs::symlink_metadata(path).await.ok()?;
        if !is_link(&meta) {
            return None;
        }
        if !async_fs::metadata(path).await.ok()?.is_dir() {
            return None;
        }

        let contents = async_fs::read(path.join(MARKER_FILE)).await.ok()?;
        let marker: LinkMarker = serde_json::from_slice(&contents).ok()?;
        (marker.managed_by == MARKER_OWNER).then_some(marker)
    }
}

/// Whether `meta` (from `symlink_metadata`) describes a link or junction
pub(crate) fn is_link(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x400;
        meta.file_type().is_symlink() || meta.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT != 0
    }

    #[cfg(not(windows))]
    {
        meta.file_type().is_symlink()
    }
}

#[cfg(unix)]
async fn create_dir_link(target: &Path, link_path: &Path) -> Result<(), LinkError> {
    async_fs::unix::symlink(target, link_path)
        .await
        .map_err(|e| LinkError::CreateFailed {
            link: link_path.to_path_buf(),
            target: target.to_path_buf(),
            reason: e.to_string(),
        })
}

#[cfg(windows)]
async fn create_dir_link(target: &Path, link_path: &Path) -> Result<(), LinkError> {
    use game_process::{Command, Launcher, LocalLauncher};

    // Junctions need no elevation, unlike directory symlinks.
    let mut mklink = Command::new("cmd");
    mklink.args(["/C", "mklink", "/J"]).arg(link_path).arg(target);

    let failed = |reason: String| LinkError::CreateFailed {
        link: link_path.to_path_buf(),
        target: target.to_path_buf(),
        reason,
    };

    let status = LocalLauncher.run(mklink).await.map_err(|e| failed(e.to_string()))?;
    if !status.success() {
        return Err(failed(format!("mklink exited with {:?}", status.code)));
    }
    Ok(())
}

#[cfg(unix)]
pub(crate) async fn remove_dir_link(path: &Path) -> io::Result<()> {
    async_fs::remove_file(path).await
}

#[cfg(windows)]
pub(crate) async fn remove_dir_link(path: &Path) -> io::Result<()> {
    // Removes the junction itself; the target's contents are untouched.
    async_fs::remove_dir(path).await
}
