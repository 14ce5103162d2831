//! Version repository: maps version identifiers to installation directories.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Resolves a version identifier to an on-disk installation path
#[async_trait]
pub trait VersionRepository: Send + Sync {
    /// Returns the install directory for `version_id`, if it is installed
    async fn resolve_install_path(&self, version_id: &str) -> Option<PathBuf>;
}

/// Versions stored as `<root>/<version_id>` directories
#[derive(Debug, Clone)]
pub struct DirectoryVersionRepository {
    root: PathBuf,
}

impl DirectoryVersionRepository {
    /// Create a repository rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding all versions
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// A version id must name exactly one directory below the repository root
fn is_plain_name(version_id: &str) -> bool {
    let mut components = Path::new(version_id).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !version_id.contains(['/', '\\'])
}

#[async_trait]
impl VersionRepository for DirectoryVersionRepository {
    async fn resolve_install_path(&self, version_id: &str) -> Option<PathBuf> {
        if !is_plain_name(version_id) {
            debug!("Rejecting version id '{}'", version_id);
            return None;
        }

        let path = self.root.join(version_id);
        match async_fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Some(path),
            _ => {
                debug!("Version '{}' not found under {}", version_id, self.root.display());
                None
            }
        }
    }
}
