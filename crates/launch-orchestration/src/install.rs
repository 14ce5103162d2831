//! Canonical install directory preparation
//!
//! The store client expects the game in `<library_root>/<install_dir_name>`.
//! Native mode puts the client's own files back there; managed mode moves
//! them aside to `<install_dir_name>.original` and links the canonical path
//! to a managed version directory instead. Both modes re-derive what to do
//! from the filesystem, so a run interrupted at any point is repaired by the
//! next one.

use crate::error::{Error, Result};
use crate::link::{LinkError, LinkManager, is_link, remove_dir_link};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix appended to the install directory name for the backup
pub const BACKUP_SUFFIX: &str = ".original";

/// What [`InstallSlot::back_up`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupOutcome {
    /// The canonical entry was renamed to the backup path
    BackedUp,
    /// A backup already existed and was left untouched
    AlreadyBackedUp,
    /// There was nothing at the canonical path
    NothingToBackUp,
}

/// What [`InstallSlot::restore`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The backup was renamed back to the canonical path
    Restored,
    /// No backup existed
    NothingToRestore,
    /// The canonical path already held a real install directory, so the stale backup was deleted
    DiscardedStaleBackup,
}

/// What currently occupies the canonical path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CanonicalEntry {
    Absent,
    /// A real directory, not a link
    Directory,
    /// A link whose target is gone
    DanglingLink,
    /// A live link or a plain file
    Other,
}

/// The canonical install location of one game inside one library root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallSlot {
    library_root: PathBuf,
    install_dir_name: String,
}

impl InstallSlot {
    /// Create a slot for `install_dir_name` under `library_root`
    pub fn new(library_root: impl Into<PathBuf>, install_dir_name: impl Into<String>) -> Self {
        Self {
            library_root: library_root.into(),
            install_dir_name: install_dir_name.into(),
        }
    }

    /// The library root containing the canonical directory
    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    /// Name of the canonical install directory
    pub fn install_dir_name(&self) -> &str {
        &self.install_dir_name
    }

    /// Where the store client expects the game
    pub fn canonical(&self) -> PathBuf {
        self.library_root.join(&self.install_dir_name)
    }

    /// Where the client's original install is parked during managed launches
    pub fn backup(&self) -> PathBuf {
        self.library_root
            .join(format!("{}{}", self.install_dir_name, BACKUP_SUFFIX))
    }

    /// Whether a backup currently exists
    pub async fn has_backup(&self) -> bool {
        async_fs::symlink_metadata(self.backup()).await.is_ok()
    }

    /// Rename the canonical entry to the backup path unless a backup already exists
    pub async fn back_up(&self) -> Result<BackupOutcome> {
        if self.has_backup().await {
            debug!("Backup {} already present", self.backup().display());
            return Ok(BackupOutcome::AlreadyBackedUp);
        }

        let canonical = self.canonical();
        if async_fs::symlink_metadata(&canonical).await.is_err() {
            return Ok(BackupOutcome::NothingToBackUp);
        }

        async_fs::rename(&canonical, self.backup())
            .await
            .map_err(|source| Error::Backup {
                path: canonical.clone(),
                source,
            })?;

        info!("Backed up {} to {}", canonical.display(), self.backup().display());
        Ok(BackupOutcome::BackedUp)
    }

    /// Remove a link at the canonical path whose target no longer exists
    ///
    /// Such a link cannot carry a readable marker, and removing it deletes no
    /// files. Returns whether a link was removed.
    pub async fn clear_dangling_link(&self) -> Result<bool> {
        let canonical = self.canonical();
        if self.canonical_entry().await != CanonicalEntry::DanglingLink {
            return Ok(false);
        }

        remove_dir_link(&canonical)
            .await
            .map_err(|source| LinkError::RemoveFailed {
                path: canonical.clone(),
                source,
            })?;
        warn!("Removed dangling link {}", canonical.display());
        Ok(true)
    }

    async fn canonical_entry(&self) -> CanonicalEntry {
        let canonical = self.canonical();
        let Ok(meta) = async_fs::symlink_metadata(&canonical).await else {
            return CanonicalEntry::Absent;
        };

        if is_link(&meta) {
            match async_fs::metadata(&canonical).await {
                Ok(_) => CanonicalEntry::Other,
                Err(_) => CanonicalEntry::DanglingLink,
            }
        } else if meta.is_dir() {
            CanonicalEntry::Directory
        } else {
            CanonicalEntry::Other
        }
    }

    /// Move the backup back to the canonical path
    ///
    /// Callers remove managed links first. A dangling link is cleared, a real
    /// directory is treated as the store client's fresh install and wins over
    /// the backup, and anything else is a conflict that leaves the backup
    /// untouched.
    pub async fn restore(&self) -> Result<RestoreOutcome> {
        let backup = self.backup();
        if !self.has_backup().await {
            return Ok(RestoreOutcome::NothingToRestore);
        }

        let canonical = self.canonical();
        match self.canonical_entry().await {
            CanonicalEntry::Absent => {}
            CanonicalEntry::DanglingLink => {
                self.clear_dangling_link().await?;
            }
            CanonicalEntry::Directory => {
                warn!(
                    "{} exists alongside backup {}, discarding the stale backup",
                    canonical.display(),
                    backup.display()
                );
                remove_entry(&backup).await.map_err(|source| Error::Restore {
                    path: backup.clone(),
                    source,
                })?;
                return Ok(RestoreOutcome::DiscardedStaleBackup);
            }
            CanonicalEntry::Other => {
                return Err(Error::RestoreConflict { path: canonical });
            }
        }

        async_fs::rename(&backup, &canonical)
            .await
            .map_err(|source| Error::Restore {
                path: backup.clone(),
                source,
            })?;

        info!("Restored {} from {}", canonical.display(), backup.display());
        Ok(RestoreOutcome::Restored)
    }
}

async fn remove_entry(path: &Path) -> std::io::Result<()> {
    let meta = async_fs::symlink_metadata(path).await?;
    if is_link(&meta) || meta.is_file() {
        #[cfg(windows)]
        if meta.is_dir() {
            return async_fs::remove_dir(path).await;
        }
        async_fs::remove_file(path).await
    } else {
        async_fs::remove_dir_all(path).await
    }
}

/// Native mode: put the store client's own install back in place
pub async fn prepare_native(slot: &InstallSlot, links: &LinkManager) -> Result<PathBuf> {
    links
        .remove_managed_links(slot.library_root(), slot.install_dir_name())
        .await?;
    let outcome = slot.restore().await?;
    debug!("Native preparation of {}: {:?}", slot.canonical().display(), outcome);
    Ok(slot.canonical())
}

/// Managed mode: park the client's install and link the canonical path to `version_dir`
pub async fn prepare_managed(
    slot: &InstallSlot,
    links: &LinkManager,
    version_dir: &Path,
) -> Result<PathBuf> {
    let canonical = slot.canonical();

    if links.is_managed_link(&canonical).await {
        links
            .remove_managed_links(slot.library_root(), slot.install_dir_name())
            .await?;
    }
    // Never park a dangling link as the backup.
    slot.clear_dangling_link().await?;

    let outcome = slot.back_up().await?;
    debug!("Managed preparation of {}: {:?}", canonical.display(), outcome);

    links.create_managed_link(version_dir, &canonical).await?;
    Ok(canonical)
}
