//! The directory a server exposes

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use lanshare_common::{FileEntry, read_directory};

use super::path::{PathError, resolve_shared_file};

/// Handle to the shared root
///
/// Clones share the same root, so the local user can re-point a running
/// server. Remote peers can only read it.
#[derive(Debug, Clone)]
pub struct SharedDirectory {
    root: Arc<RwLock<PathBuf>>,
}

impl SharedDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(RwLock::new(root.into())),
        }
    }

    /// Current shared root, as the user set it
    pub fn root(&self) -> PathBuf {
        self.root
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the shared root
    ///
    /// The path is not checked here; a missing directory surfaces as an
    /// error on the next listing or request.
    pub fn set_root(&self, root: impl Into<PathBuf>) {
        *self.root.write().unwrap_or_else(PoisonError::into_inner) = root.into();
    }

    /// Immediate children of the shared root, sorted by name
    pub async fn list(&self) -> io::Result<Vec<FileEntry>> {
        read_directory(&self.root()).await
    }

    /// Resolve a requested name to a canonical path under the root
    pub fn resolve(&self, name: &str) -> Result<PathBuf, PathError> {
        resolve_shared_file(&self.root(), name)
    }
}

impl Default for SharedDirectory {
    fn default() -> Self {
        Self::new(".")
    }
}
